//! DNS message encoding and decoding, plus the plumbing to run queries over
//! UDP: a table of in-flight requests keyed by transaction id, a request
//! lifecycle with timeout and cancellation, a small stub client and a
//! minimal server.

use std::time::Duration;

pub mod dns_parser;

mod address_family;
pub use crate::address_family::AddressFamily;

pub mod client;
mod error;
pub mod pending;
pub mod request;
pub mod server;

pub use crate::client::{Client, ClientConfig, MxRecord, SrvRecord};
pub use crate::error::Error;
pub use crate::pending::{PendingRequests, MAX_ID};
pub use crate::request::{Outcome, Request, RequestHandle};
pub use crate::server::{Handler, Server, ServerHandle};

pub const DNS_PORT: u16 = 53;

/// How long a request waits for its answer unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);
