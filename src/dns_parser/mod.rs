//! DNS wire format: reading and writing packets
//!
//! Decoding follows compression pointers anywhere in the packet; encoding
//! always writes names in full.

mod builder;
mod cursor;
mod enums;
mod error;
mod header;
pub mod name;
mod parser;
mod rrdata;
mod structs;

pub use self::builder::{Additional, Answers, Builder, Nameservers, Questions, MAX_UDP_SIZE};
pub use self::cursor::Cursor;
pub use self::enums::{Class, Opcode, ResponseCode, Type, UnknownName};
pub use self::error::Error;
pub use self::header::{Header, HEADER_SIZE};
pub use self::rrdata::RRData;
pub use self::structs::{Message, Question, ResourceRecord};
