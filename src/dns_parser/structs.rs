use super::{Class, Header, RRData, Type};

/// Parsed DNS packet
///
/// The counts in `header` describe what was on the wire; when the message
/// is written they are recomputed from the section lengths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub nameservers: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

/// A parsed chunk of data in the Query section of the packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub qname: String,
    pub qtype: Type,
    pub qclass: Class,
}

/// A single DNS record
///
/// Known types are decoded into `data`; everything else stays as the
/// verbatim rdata in `RRData::Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub cls: Class,
    pub ttl: u32,
    pub data: RRData,
}

impl Question {
    pub fn new<N: Into<String>>(qname: N, qtype: Type) -> Question {
        Question {
            qname: qname.into(),
            qtype,
            qclass: Class::IN,
        }
    }
}

impl ResourceRecord {
    pub fn new<N: Into<String>>(name: N, ttl: u32, data: RRData) -> ResourceRecord {
        ResourceRecord {
            name: name.into(),
            cls: Class::IN,
            ttl,
            data,
        }
    }

    pub fn typ(&self) -> Type {
        self.data.typ()
    }
}

impl Message {
    /// A standard query with a single question
    pub fn query(id: u16, recursion: bool, question: Question) -> Message {
        Message {
            header: Header {
                id,
                recursion_desired: recursion,
                ..Header::default()
            },
            questions: vec![question],
            ..Message::default()
        }
    }

    /// An empty response echoing the id, opcode, recursion flag and
    /// questions of `query`
    pub fn response_to(query: &Message) -> Message {
        Message {
            header: Header {
                id: query.header.id,
                query: false,
                opcode: query.header.opcode,
                recursion_desired: query.header.recursion_desired,
                ..Header::default()
            },
            questions: query.questions.clone(),
            ..Message::default()
        }
    }

    /// Answer records of type `typ`, in order
    pub fn answers_of(&self, typ: Type) -> impl Iterator<Item = &ResourceRecord> {
        self.answers.iter().filter(move |rr| rr.typ() == typ)
    }
}
