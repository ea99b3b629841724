use thiserror::Error;

/// Error encoding or decoding a DNS packet
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("read would go past the end of the buffer")]
    OutOfBounds,
    #[error("cannot seek to position {0}")]
    InvalidSeek(usize),
    #[error("label of {0} bytes exceeds the 63 byte limit")]
    LabelTooLong(usize),
    #[error("domain name contains an empty label")]
    EmptyLabel,
    #[error("label in domain name has unknown label format")]
    UnknownLabelFormat,
    #[error("invalid characters encountered while reading label")]
    LabelIsNotUtf8,
    #[error("compression pointer revisits an offset already read")]
    CompressionLoop,
    #[error("record data runs past the end of the packet")]
    TruncatedRecord,
    #[error("wrong (too short or too long) size of RDATA")]
    WrongRdataLength,
    #[error("character-string of {0} bytes exceeds 255")]
    TextTooLong(usize),
    #[error("packet is structurally invalid")]
    MalformedMessage,
    #[error("no encoder and no raw data for record type {0}")]
    UnsupportedRecordType(u16),
}
