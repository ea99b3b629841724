use byteorder::{BigEndian, ByteOrder};

use super::Error;

/// A read position over a borrowed packet buffer
///
/// All integer reads are big-endian and advance the position. A read that
/// would run past the end fails with `Error::OutOfBounds` and leaves the
/// position untouched.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Cursor<'a> {
        Cursor { buf, pos: 0 }
    }

    /// The whole underlying buffer, independent of the current position
    pub fn get_ref(&self) -> &'a [u8] {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once every byte has been consumed
    pub fn at_end(&self) -> bool {
        self.pos == self.buf.len()
    }

    pub fn seek(&mut self, pos: usize) -> Result<(), Error> {
        if pos > self.buf.len() {
            return Err(Error::InvalidSeek(pos));
        }
        self.pos = pos;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(len).ok_or(Error::OutOfBounds)?;
        if end > self.buf.len() {
            return Err(Error::OutOfBounds);
        }
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }

    /// Splits off the next `len` bytes as their own cursor, starting at zero,
    /// and moves this cursor past them.
    pub fn slice(&mut self, len: usize) -> Result<Cursor<'a>, Error> {
        self.read_bytes(len).map(Cursor::new)
    }
}
