use super::name::read_name_at;
use super::{Class, Cursor, Error, Message, Question, RRData, ResourceRecord, Type};

/// Record sections in the order they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Answers,
    Nameservers,
    Additional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    HeaderId,
    HeaderFlags,
    HeaderCounts,
    Question,
    Resource(Section),
    End,
}

impl Section {
    fn next(self) -> State {
        match self {
            Section::Answers => State::Resource(Section::Nameservers),
            Section::Nameservers => State::Resource(Section::Additional),
            Section::Additional => State::End,
        }
    }
}

impl Message {
    /// Parse a full DNS packet.
    ///
    /// The header counts decide how many entries each section holds. At most
    /// one question is supported; anything else, or any malformed entry,
    /// fails the whole parse.
    pub fn parse(data: &[u8]) -> Result<Message, Error> {
        let mut cur = Cursor::new(data);
        let mut msg = Message::default();
        let mut state = State::HeaderId;

        loop {
            state = match state {
                State::HeaderId => {
                    msg.header.id = cur.read_u16()?;
                    State::HeaderFlags
                }
                State::HeaderFlags => {
                    msg.header.set_flags(cur.read_u16()?);
                    State::HeaderCounts
                }
                State::HeaderCounts => {
                    msg.header.questions = cur.read_u16()?;
                    msg.header.answers = cur.read_u16()?;
                    msg.header.nameservers = cur.read_u16()?;
                    msg.header.additional = cur.read_u16()?;
                    match msg.header.questions {
                        0 => State::Resource(Section::Answers),
                        1 => State::Question,
                        _ => return Err(Error::MalformedMessage),
                    }
                }
                State::Question => {
                    msg.questions.push(Question::parse(&mut cur)?);
                    State::Resource(Section::Answers)
                }
                State::Resource(section) => {
                    let (expected, records) = match section {
                        Section::Answers => (msg.header.answers, &mut msg.answers),
                        Section::Nameservers => (msg.header.nameservers, &mut msg.nameservers),
                        Section::Additional => (msg.header.additional, &mut msg.additional),
                    };
                    if records.len() == usize::from(expected) {
                        section.next()
                    } else {
                        records.push(ResourceRecord::parse(&mut cur)?);
                        State::Resource(section)
                    }
                }
                State::End => return Ok(msg),
            };
        }
    }
}

impl Question {
    fn parse(cur: &mut Cursor) -> Result<Question, Error> {
        Ok(Question {
            qname: read_name_at(cur)?,
            qtype: Type::from(cur.read_u16()?),
            qclass: Class::from(cur.read_u16()?),
        })
    }
}

impl ResourceRecord {
    fn parse(cur: &mut Cursor) -> Result<ResourceRecord, Error> {
        let name = read_name_at(cur)?;
        let typ = Type::from(cur.read_u16()?);
        let cls = Class::from(cur.read_u16()?);
        let ttl = cur.read_u32()?;
        let len = usize::from(cur.read_u16()?);

        let offset = cur.tell();
        cur.slice(len).map_err(|_| Error::TruncatedRecord)?;
        let data = RRData::parse(typ, cur.get_ref(), offset, len)?;

        Ok(ResourceRecord {
            name,
            cls,
            ttl,
            data,
        })
    }
}

#[cfg(test)]
mod test {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::dns_parser::{Opcode, ResponseCode};

    #[test]
    fn parse_example_query() {
        let query = b"\x06%\x01\x00\x00\x01\x00\x00\x00\x00\x00\x00\
                      \x07example\x03com\x00\x00\x01\x00\x01";
        let packet = Message::parse(query).unwrap();
        assert_eq!(packet.header.id, 1573);
        assert!(packet.header.query);
        assert_eq!(packet.header.opcode, Opcode::StandardQuery);
        assert!(packet.header.recursion_desired);
        assert_eq!(packet.questions, vec![Question::new("example.com", Type::A)]);
        assert!(packet.answers.is_empty());
    }

    #[test]
    fn parse_example_response() {
        let response = b"\x06%\x81\x80\x00\x01\x00\x01\x00\x00\x00\x00\
                         \x07example\x03com\x00\x00\x01\x00\x01\
                         \xc0\x0c\x00\x01\x00\x01\x00\x00\x02\x58\x00\x04\
                         \x5d\xb8\xd8\x22";
        let packet = Message::parse(response).unwrap();
        assert!(!packet.header.query);
        assert!(packet.header.recursion_available);
        assert_eq!(packet.header.response_code, ResponseCode::NoError);
        assert_eq!(packet.answers.len(), 1);
        assert_eq!(
            packet.answers[0],
            ResourceRecord::new("example.com", 600, RRData::A(Ipv4Addr::new(93, 184, 216, 34)))
        );
    }

    #[test]
    fn cname_pointing_into_question() {
        let response = b"\x00\x02\x81\x80\x00\x01\x00\x01\x00\x00\x00\x00\
                         \x03www\x07example\x03com\x00\x00\x05\x00\x01\
                         \xc0\x0c\x00\x05\x00\x01\x00\x00\x0e\x10\x00\x02\xc0\x10";
        let packet = Message::parse(response).unwrap();
        assert_eq!(packet.answers[0].name, "www.example.com");
        assert_eq!(packet.answers[0].ttl, 3600);
        assert_eq!(packet.answers[0].data, RRData::CNAME("example.com".to_owned()));

        let self_ref = b"\x00\x02\x81\x80\x00\x01\x00\x01\x00\x00\x00\x00\
                         \x03www\x07example\x03com\x00\x00\x05\x00\x01\
                         \xc0\x0c\x00\x05\x00\x01\x00\x00\x0e\x10\x00\x02\xc0\x2d";
        assert_eq!(Message::parse(self_ref), Err(Error::CompressionLoop));
    }

    #[test]
    fn sections_follow_counts() {
        let packet = b"\x00\x03\x84\x00\x00\x00\x00\x00\x00\x01\x00\x01\
                       \x00\x00\x02\x00\x01\x00\x00\x00\x3c\x00\x05\x01a\x01b\x00\
                       \x01c\x00\x00\x1c\x00\x01\x00\x00\x00\x3c\x00\x10\
                       \x20\x01\x0d\xb8\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x01";
        let packet = Message::parse(packet).unwrap();
        assert!(packet.header.authoritative);
        assert!(packet.questions.is_empty());
        assert!(packet.answers.is_empty());
        assert_eq!(packet.nameservers[0].data, RRData::NS("a.b".to_owned()));
        assert_eq!(packet.additional[0].name, "c");
        assert_eq!(
            packet.additional[0].data,
            RRData::AAAA("2001:db8::1".parse().unwrap())
        );
    }

    #[test]
    fn malformed_packets() {
        assert_eq!(Message::parse(b"\x00\x01\x01"), Err(Error::OutOfBounds));

        let two_questions = b"\x00\x01\x01\x00\x00\x02\x00\x00\x00\x00\x00\x00";
        assert_eq!(Message::parse(two_questions), Err(Error::MalformedMessage));

        // one answer promised, none present
        let missing = b"\x00\x01\x81\x80\x00\x00\x00\x01\x00\x00\x00\x00";
        assert_eq!(Message::parse(missing), Err(Error::OutOfBounds));

        // rdata length of 8 with only 4 bytes left
        let truncated = b"\x00\x01\x81\x80\x00\x00\x00\x01\x00\x00\x00\x00\
                          \x00\x00\x01\x00\x01\x00\x00\x00\x3c\x00\x08\x01\x02\x03\x04";
        assert_eq!(Message::parse(truncated), Err(Error::TruncatedRecord));
    }
}
