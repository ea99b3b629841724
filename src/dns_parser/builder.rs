use std::marker::PhantomData;

use byteorder::{BigEndian, ByteOrder};

use super::header::HEADER_SIZE;
use super::name::write_name;
use super::{Error, Header, Message, Question, ResourceRecord};

pub enum Questions {}
pub enum Answers {}
pub enum Nameservers {}
pub enum Additional {}

pub trait MoveTo<T> {}
impl<T> MoveTo<T> for T {}

impl MoveTo<Answers> for Questions {}

impl MoveTo<Nameservers> for Questions {}
impl MoveTo<Nameservers> for Answers {}

impl MoveTo<Additional> for Questions {}
impl MoveTo<Additional> for Answers {}
impl MoveTo<Additional> for Nameservers {}

/// Classic DNS packet size limit over UDP
pub const MAX_UDP_SIZE: usize = 512;

/// Allows to build a DNS packet
///
/// Sections can only be filled in wire order; the header counts are
/// incremented as entries are added, so they always match the contents.
/// Names are written uncompressed.
pub struct Builder<S> {
    buf: Vec<u8>,
    max_size: Option<usize>,
    _state: PhantomData<S>,
}

impl Builder<Questions> {
    /// Starts a packet with the flags and id of `header`. Its counts are
    /// ignored.
    pub fn new(header: &Header) -> Builder<Questions> {
        let head = Header {
            questions: 0,
            answers: 0,
            nameservers: 0,
            additional: 0,
            ..*header
        };
        let mut buf = Vec::with_capacity(MAX_UDP_SIZE);
        buf.extend_from_slice(&[0u8; HEADER_SIZE]);
        head.write(&mut buf[..HEADER_SIZE]);
        Builder {
            buf,
            max_size: Some(MAX_UDP_SIZE),
            _state: PhantomData,
        }
    }

    /// Creates a new query
    ///
    /// Initially all sections are empty. You're expected to fill
    /// the questions section with `add_question`
    pub fn new_query(id: u16, recursion: bool) -> Builder<Questions> {
        Builder::new(&Header {
            id,
            recursion_desired: recursion,
            ..Header::default()
        })
    }

    pub fn new_response(id: u16, recursion: bool, authoritative: bool) -> Builder<Questions> {
        Builder::new(&Header {
            id,
            query: false,
            authoritative,
            recursion_desired: recursion,
            ..Header::default()
        })
    }
}

impl<T> Builder<T> {
    fn write_rr(&mut self, rr: &ResourceRecord) -> Result<(), Error> {
        write_name(&rr.name, &mut self.buf)?;
        self.buf.extend_from_slice(&u16::from(rr.typ()).to_be_bytes());
        self.buf.extend_from_slice(&u16::from(rr.cls).to_be_bytes());
        self.buf.extend_from_slice(&rr.ttl.to_be_bytes());

        let size_offset = self.buf.len();
        self.buf.extend_from_slice(&[0, 0]);

        let data_offset = self.buf.len();
        rr.data.write_to(&mut self.buf)?;
        let data_size = self.buf.len() - data_offset;
        if data_size > usize::from(u16::MAX) {
            return Err(Error::WrongRdataLength);
        }

        BigEndian::write_u16(
            &mut self.buf[size_offset..size_offset + 2],
            data_size as u16,
        );
        Ok(())
    }

    /// Returns the final packet
    ///
    /// When packet is not truncated method returns `Ok(packet)`. If
    /// packet is truncated the method returns `Err(packet)`. In both
    /// cases the packet is fully valid.
    ///
    /// In the server implementation you may use
    /// `x.build().unwrap_or_else(|x| x)`.
    pub fn build(mut self) -> Result<Vec<u8>, Vec<u8>> {
        match self.max_size {
            Some(max_size) if self.buf.len() > max_size => {
                Header::set_truncated(&mut self.buf[..HEADER_SIZE]);
                Err(self.buf)
            }
            _ => Ok(self.buf),
        }
    }

    pub fn move_to<U>(self) -> Builder<U>
    where
        T: MoveTo<U>,
    {
        Builder {
            buf: self.buf,
            max_size: self.max_size,
            _state: PhantomData,
        }
    }

    pub fn set_max_size(&mut self, max_size: Option<usize>) {
        self.max_size = max_size;
    }

    pub fn is_empty(&self) -> bool {
        Header::question_count(&self.buf) == 0
            && Header::answer_count(&self.buf) == 0
            && Header::nameserver_count(&self.buf) == 0
            && Header::additional_count(&self.buf) == 0
    }
}

impl<T: MoveTo<Questions>> Builder<T> {
    /// Adds a question to the packet
    pub fn add_question(self, question: &Question) -> Result<Builder<Questions>, Error> {
        let mut builder = self.move_to::<Questions>();

        write_name(&question.qname, &mut builder.buf)?;
        builder
            .buf
            .extend_from_slice(&u16::from(question.qtype).to_be_bytes());
        builder
            .buf
            .extend_from_slice(&u16::from(question.qclass).to_be_bytes());
        Header::inc_questions(&mut builder.buf).ok_or(Error::MalformedMessage)?;
        Ok(builder)
    }
}

impl<T: MoveTo<Answers>> Builder<T> {
    pub fn add_answer(self, rr: &ResourceRecord) -> Result<Builder<Answers>, Error> {
        let mut builder = self.move_to::<Answers>();

        builder.write_rr(rr)?;
        Header::inc_answers(&mut builder.buf).ok_or(Error::MalformedMessage)?;
        Ok(builder)
    }
}

impl<T: MoveTo<Nameservers>> Builder<T> {
    pub fn add_nameserver(self, rr: &ResourceRecord) -> Result<Builder<Nameservers>, Error> {
        let mut builder = self.move_to::<Nameservers>();

        builder.write_rr(rr)?;
        Header::inc_nameservers(&mut builder.buf).ok_or(Error::MalformedMessage)?;
        Ok(builder)
    }
}

impl Builder<Additional> {
    pub fn add_additional(self, rr: &ResourceRecord) -> Result<Builder<Additional>, Error> {
        let mut builder = self.move_to::<Additional>();

        builder.write_rr(rr)?;
        Header::inc_additional(&mut builder.buf).ok_or(Error::MalformedMessage)?;
        Ok(builder)
    }
}

impl Message {
    /// Serializes the whole message without any size limit.
    ///
    /// Header counts are taken from the section lengths, not from `header`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut builder = Builder::new(&self.header);
        builder.set_max_size(None);
        for question in &self.questions {
            builder = builder.add_question(question)?;
        }

        let mut builder = builder.move_to::<Answers>();
        for rr in &self.answers {
            builder = builder.add_answer(rr)?;
        }

        let mut builder = builder.move_to::<Nameservers>();
        for rr in &self.nameservers {
            builder = builder.add_nameserver(rr)?;
        }

        let mut builder = builder.move_to::<Additional>();
        for rr in &self.additional {
            builder = builder.add_additional(rr)?;
        }

        Ok(builder.build().unwrap_or_else(|x| x))
    }
}
