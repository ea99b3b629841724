use byteorder::{BigEndian, ByteOrder};

use super::{Opcode, ResponseCode};

mod flag {
    pub const QUERY: u16 = 0b1000_0000_0000_0000;
    pub const OPCODE_MASK: u16 = 0b0111_1000_0000_0000;
    pub const AUTHORITATIVE: u16 = 0b0000_0100_0000_0000;
    pub const TRUNCATED: u16 = 0b0000_0010_0000_0000;
    pub const RECURSION_DESIRED: u16 = 0b0000_0001_0000_0000;
    pub const RECURSION_AVAILABLE: u16 = 0b0000_0000_1000_0000;
    pub const RESERVED_MASK: u16 = 0b0000_0000_0111_0000;
    pub const RESPONSE_CODE_MASK: u16 = 0b0000_0000_0000_1111;
}

/// Size of the fixed header on the wire
pub const HEADER_SIZE: usize = 12;

/// Represents parsed header of the packet
///
/// `query` is true for queries; the wire QR bit is its inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub query: bool,
    pub opcode: Opcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    /// The three bits between RA and RCODE, kept as read
    pub reserved: u8,
    pub response_code: ResponseCode,
    pub questions: u16,
    pub answers: u16,
    pub nameservers: u16,
    pub additional: u16,
}

impl Default for Header {
    fn default() -> Header {
        Header {
            id: 0,
            query: true,
            opcode: Opcode::StandardQuery,
            authoritative: false,
            truncated: false,
            recursion_desired: false,
            recursion_available: false,
            reserved: 0,
            response_code: ResponseCode::NoError,
            questions: 0,
            answers: 0,
            nameservers: 0,
            additional: 0,
        }
    }
}

impl Header {
    pub fn flags(&self) -> u16 {
        let mut flags = 0;
        if !self.query {
            flags |= flag::QUERY;
        }
        flags |= (u16::from(u8::from(self.opcode)) << 11) & flag::OPCODE_MASK;
        if self.authoritative {
            flags |= flag::AUTHORITATIVE;
        }
        if self.truncated {
            flags |= flag::TRUNCATED;
        }
        if self.recursion_desired {
            flags |= flag::RECURSION_DESIRED;
        }
        if self.recursion_available {
            flags |= flag::RECURSION_AVAILABLE;
        }
        flags |= (u16::from(self.reserved) << 4) & flag::RESERVED_MASK;
        flags |= u16::from(u8::from(self.response_code)) & flag::RESPONSE_CODE_MASK;
        flags
    }

    /// Overwrites every field except `id` and the counts from a flags word
    pub fn set_flags(&mut self, flags: u16) {
        self.query = flags & flag::QUERY == 0;
        self.opcode = Opcode::from(((flags & flag::OPCODE_MASK) >> 11) as u8);
        self.authoritative = flags & flag::AUTHORITATIVE != 0;
        self.truncated = flags & flag::TRUNCATED != 0;
        self.recursion_desired = flags & flag::RECURSION_DESIRED != 0;
        self.recursion_available = flags & flag::RECURSION_AVAILABLE != 0;
        self.reserved = ((flags & flag::RESERVED_MASK) >> 4) as u8;
        self.response_code = ResponseCode::from((flags & flag::RESPONSE_CODE_MASK) as u8);
    }

    /// Writes the header into the first twelve bytes of `data`
    pub fn write(&self, data: &mut [u8]) {
        BigEndian::write_u16(&mut data[..2], self.id);
        BigEndian::write_u16(&mut data[2..4], self.flags());
        BigEndian::write_u16(&mut data[4..6], self.questions);
        BigEndian::write_u16(&mut data[6..8], self.answers);
        BigEndian::write_u16(&mut data[8..10], self.nameservers);
        BigEndian::write_u16(&mut data[10..12], self.additional);
    }

    pub fn question_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[4..6])
    }

    pub fn answer_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[6..8])
    }

    pub fn nameserver_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[8..10])
    }

    pub fn additional_count(data: &[u8]) -> u16 {
        BigEndian::read_u16(&data[10..12])
    }

    fn increment(data: &mut [u8], at: usize) -> Option<u16> {
        let count = BigEndian::read_u16(&data[at..at + 2]).checked_add(1)?;
        BigEndian::write_u16(&mut data[at..at + 2], count);
        Some(count)
    }

    pub fn inc_questions(data: &mut [u8]) -> Option<u16> {
        Header::increment(data, 4)
    }

    pub fn inc_answers(data: &mut [u8]) -> Option<u16> {
        Header::increment(data, 6)
    }

    pub fn inc_nameservers(data: &mut [u8]) -> Option<u16> {
        Header::increment(data, 8)
    }

    pub fn inc_additional(data: &mut [u8]) -> Option<u16> {
        Header::increment(data, 10)
    }

    pub fn set_truncated(data: &mut [u8]) {
        data[2] |= (flag::TRUNCATED >> 8) as u8;
    }
}
