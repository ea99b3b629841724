use std::str::from_utf8;

use super::{Cursor, Error};

/// Longest label allowed on the wire
pub const MAX_LABEL_LEN: usize = 63;

const POINTER_MASK: u8 = 0b1100_0000;

/// Appends `name` as a sequence of length-prefixed labels terminated by a
/// zero byte. Names are always written in full, never compressed.
///
/// A trailing dot is accepted, and both `""` and `"."` encode the root.
pub fn write_name(name: &str, buf: &mut Vec<u8>) -> Result<(), Error> {
    let name = name.strip_suffix('.').unwrap_or(name);
    if !name.is_empty() {
        for label in name.split('.') {
            if label.is_empty() {
                return Err(Error::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(Error::LabelTooLong(label.len()));
            }
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
    }
    buf.push(0);
    Ok(())
}

/// Reads the name starting at `offset` in `original`, following compression
/// pointers anywhere in `original`.
///
/// Returns the dotted name and how many bytes it occupies at `offset`. Bytes
/// reached only through a pointer are not counted; the two pointer bytes are.
pub fn read_name(original: &[u8], offset: usize) -> Result<(String, usize), Error> {
    let mut name = String::new();
    let mut pos = offset;
    let mut consumed = None;
    let mut visited = Vec::new();

    loop {
        if visited.contains(&pos) {
            return Err(Error::CompressionLoop);
        }
        visited.push(pos);

        let byte = *original.get(pos).ok_or(Error::OutOfBounds)?;
        if byte == 0 {
            let consumed = consumed.unwrap_or_else(|| pos + 1 - offset);
            return Ok((name, consumed));
        } else if byte & POINTER_MASK == POINTER_MASK {
            let low = *original.get(pos + 1).ok_or(Error::OutOfBounds)?;
            if consumed.is_none() {
                consumed = Some(pos + 2 - offset);
            }
            pos = (usize::from(byte & !POINTER_MASK) << 8) | usize::from(low);
        } else if byte & POINTER_MASK == 0 {
            let end = pos + 1 + usize::from(byte);
            let label = original.get(pos + 1..end).ok_or(Error::OutOfBounds)?;
            let label = from_utf8(label).map_err(|_| Error::LabelIsNotUtf8)?;
            if !name.is_empty() {
                name.push('.');
            }
            name.push_str(label);
            pos = end;
        } else {
            return Err(Error::UnknownLabelFormat);
        }
    }
}

/// Reads a name at the cursor position and moves the cursor past it.
///
/// Pointers resolve against the cursor's whole buffer, so the cursor must
/// span the complete message.
pub fn read_name_at(cursor: &mut Cursor) -> Result<String, Error> {
    let start = cursor.tell();
    let (name, consumed) = read_name(cursor.get_ref(), start)?;
    cursor.seek(start + consumed)?;
    Ok(name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn writes_labels() {
        let mut buf = Vec::new();
        write_name("example.com", &mut buf).unwrap();
        assert_eq!(&buf[..], &b"\x07example\x03com\x00"[..]);

        buf.clear();
        write_name("example.com.", &mut buf).unwrap();
        assert_eq!(&buf[..], &b"\x07example\x03com\x00"[..]);

        buf.clear();
        write_name("", &mut buf).unwrap();
        assert_eq!(&buf[..], &b"\x00"[..]);
    }

    #[test]
    fn rejects_bad_labels() {
        let long = "a".repeat(64);
        let mut buf = Vec::new();
        assert_eq!(
            write_name(&format!("{}.com", long), &mut buf),
            Err(Error::LabelTooLong(64))
        );
        assert_eq!(write_name("a..com", &mut buf), Err(Error::EmptyLabel));
    }

    #[test]
    fn longest_label_round_trips() {
        let name = format!("{}.example", "x".repeat(63));
        let mut buf = Vec::new();
        write_name(&name, &mut buf).unwrap();
        assert_eq!(read_name(&buf, 0).unwrap(), (name, buf.len()));
    }

    #[test]
    fn follows_pointer() {
        // "example.com" at 0, then "www" + pointer to 0 at 13
        let packet = b"\x07example\x03com\x00\x03www\xc0\x00";
        assert_eq!(read_name(packet, 0).unwrap(), ("example.com".to_owned(), 13));
        assert_eq!(
            read_name(packet, 13).unwrap(),
            ("www.example.com".to_owned(), 6)
        );
    }

    #[test]
    fn pointer_into_middle_of_name() {
        let packet = b"\x07example\x03com\x00\x04mail\xc0\x08";
        let (direct, _) = read_name(packet, 8).unwrap();
        let (via_pointer, consumed) = read_name(packet, 13).unwrap();
        assert_eq!(direct, "com");
        assert_eq!(via_pointer, format!("mail.{}", direct));
        assert_eq!(consumed, 7);
    }

    #[test]
    fn pointer_behind_name_start() {
        // two padding bytes keep the target well before the name at 15
        let packet = b"\x07example\x03com\x00\x00\x00\x03www\xc0\x00";
        assert_eq!(
            read_name(packet, 15).unwrap(),
            ("www.example.com".to_owned(), 6)
        );
        assert_eq!(read_name(b"\x00\x00\xc0\x00", 2).unwrap(), (String::new(), 2));
    }

    #[test]
    fn detects_loops() {
        assert_eq!(read_name(b"\xc0\x00", 0), Err(Error::CompressionLoop));
        assert_eq!(
            read_name(b"\x01a\xc0\x04\xc0\x00", 0),
            Err(Error::CompressionLoop)
        );
        assert_eq!(
            read_name(b"\x00\x00\x03abc\xc0\x02", 2),
            Err(Error::CompressionLoop)
        );
    }

    #[test]
    fn truncated_names() {
        assert_eq!(read_name(b"\x07exam", 0), Err(Error::OutOfBounds));
        assert_eq!(read_name(b"\x03com", 0), Err(Error::OutOfBounds));
        assert_eq!(read_name(b"\xc0", 0), Err(Error::OutOfBounds));
        assert_eq!(read_name(b"\xc0\x10", 0), Err(Error::OutOfBounds));
        assert_eq!(read_name(b"\x40a\x00", 0), Err(Error::UnknownLabelFormat));
    }

    #[test]
    fn cursor_moves_past_name() {
        let packet = b"\x07example\x03com\x00\x03www\xc0\x00\xff";
        let mut cur = Cursor::new(packet);
        cur.seek(13).unwrap();
        assert_eq!(read_name_at(&mut cur).unwrap(), "www.example.com");
        assert_eq!(cur.read_u8().unwrap(), 0xff);
    }
}
