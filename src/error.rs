use std::io;

use thiserror::Error;

use crate::dns_parser;

/// Error issuing a query or waiting for its answer
#[derive(Debug, Error)]
pub enum Error {
    #[error("dns packet error: {0}")]
    Parse(#[from] dns_parser::Error),
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("no response within the timeout")]
    Timeout,
    #[error("request was cancelled")]
    Cancelled,
}
