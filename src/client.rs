use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use crate::address_family::AddressFamily;
use crate::dns_parser::{Message, Question, RRData, Type};
use crate::error::Error;
use crate::pending::PendingRequests;
use crate::request::Request;
use crate::{DEFAULT_TIMEOUT, DNS_PORT};

/// Where and how a `Client` sends its queries
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server: SocketAddr,
    pub timeout: Duration,
    pub recursion_desired: bool,
}

impl Default for ClientConfig {
    fn default() -> ClientConfig {
        ClientConfig {
            server: SocketAddr::new(Ipv4Addr::new(8, 8, 8, 8).into(), DNS_PORT),
            timeout: DEFAULT_TIMEOUT,
            recursion_desired: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub priority: u16,
    pub exchange: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
    pub name: String,
}

/// Issues queries to one server through a shared table of pending requests
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    pending: PendingRequests,
}

impl Client {
    pub fn new(config: ClientConfig) -> Client {
        Client::with_pending(config, PendingRequests::new())
    }

    /// A client sharing its sockets and id space with others using `pending`
    pub fn with_pending(config: ClientConfig, pending: PendingRequests) -> Client {
        Client { config, pending }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn pending(&self) -> &PendingRequests {
        &self.pending
    }

    /// A request for `question` carrying this client's settings
    pub fn request(&self, question: Question) -> Request {
        Request::new(question, self.config.server)
            .with_timeout(self.config.timeout)
            .with_recursion(self.config.recursion_desired)
    }

    pub async fn query(&self, question: Question) -> Result<Message, Error> {
        self.request(question).query(&self.pending).await
    }

    /// The answer records of type `typ`. No matching record is not an error.
    pub async fn resolve(&self, name: &str, typ: Type) -> Result<Vec<RRData>, Error> {
        let response = self.query(Question::new(name, typ)).await?;
        Ok(response.answers_of(typ).map(|rr| rr.data.clone()).collect())
    }

    pub async fn resolve4(&self, name: &str) -> Result<Vec<Ipv4Addr>, Error> {
        Ok(self
            .resolve(name, Type::A)
            .await?
            .into_iter()
            .filter_map(|data| match data {
                RRData::A(ip) => Some(ip),
                _ => None,
            })
            .collect())
    }

    pub async fn resolve6(&self, name: &str) -> Result<Vec<Ipv6Addr>, Error> {
        Ok(self
            .resolve(name, Type::AAAA)
            .await?
            .into_iter()
            .filter_map(|data| match data {
                RRData::AAAA(ip) => Some(ip),
                _ => None,
            })
            .collect())
    }

    pub async fn resolve_mx(&self, name: &str) -> Result<Vec<MxRecord>, Error> {
        Ok(self
            .resolve(name, Type::MX)
            .await?
            .into_iter()
            .filter_map(|data| match data {
                RRData::MX {
                    preference,
                    exchange,
                } => Some(MxRecord {
                    priority: preference,
                    exchange,
                }),
                _ => None,
            })
            .collect())
    }

    /// One entry per record, holding its strings in order
    pub async fn resolve_txt(&self, name: &str) -> Result<Vec<Vec<String>>, Error> {
        Ok(self
            .resolve(name, Type::TXT)
            .await?
            .into_iter()
            .filter_map(|data| match data {
                RRData::TXT(strings) => Some(
                    strings
                        .iter()
                        .map(|s| String::from_utf8_lossy(s).into_owned())
                        .collect(),
                ),
                _ => None,
            })
            .collect())
    }

    pub async fn resolve_srv(&self, name: &str) -> Result<Vec<SrvRecord>, Error> {
        Ok(self
            .resolve(name, Type::SRV)
            .await?
            .into_iter()
            .filter_map(|data| match data {
                RRData::SRV {
                    priority,
                    weight,
                    port,
                    target,
                } => Some(SrvRecord {
                    priority,
                    weight,
                    port,
                    name: target,
                }),
                _ => None,
            })
            .collect())
    }

    pub async fn resolve_ns(&self, name: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .resolve(name, Type::NS)
            .await?
            .into_iter()
            .filter_map(|data| match data {
                RRData::NS(name) => Some(name),
                _ => None,
            })
            .collect())
    }

    pub async fn resolve_cname(&self, name: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .resolve(name, Type::CNAME)
            .await?
            .into_iter()
            .filter_map(|data| match data {
                RRData::CNAME(name) => Some(name),
                _ => None,
            })
            .collect())
    }

    /// The first address of `family` found in the answer, if any
    pub async fn lookup(&self, name: &str, family: AddressFamily) -> Result<Option<IpAddr>, Error> {
        let typ = match family {
            AddressFamily::Inet => Type::A,
            AddressFamily::Inet6 => Type::AAAA,
        };
        let response = self.query(Question::new(name, typ)).await?;
        Ok(response.answers.iter().find_map(|rr| match rr.data {
            RRData::A(ip) => Some(IpAddr::V4(ip)),
            RRData::AAAA(ip) => Some(IpAddr::V6(ip)),
            _ => None,
        }))
    }
}
