use std::net::{Ipv4Addr, Ipv6Addr};

use byteorder::{BigEndian, ByteOrder};

use super::name::{read_name, write_name};
use super::{Error, Type};

/// The enumeration that represents known types of DNS resource records data
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum RRData {
    CNAME(String),
    NS(String),
    PTR(String),
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    MX {
        preference: u16,
        exchange: String,
    },
    /// Each character-string without its length byte
    TXT(Vec<Vec<u8>>),
    /// Anything that isn't decoded, kept verbatim. `data` of `None` means the
    /// caller supplied no bytes and the record cannot be written.
    Unknown { typ: Type, data: Option<Vec<u8>> },
}

impl RRData {
    pub fn typ(&self) -> Type {
        match *self {
            RRData::CNAME(..) => Type::CNAME,
            RRData::NS(..) => Type::NS,
            RRData::PTR(..) => Type::PTR,
            RRData::A(..) => Type::A,
            RRData::AAAA(..) => Type::AAAA,
            RRData::SRV { .. } => Type::SRV,
            RRData::MX { .. } => Type::MX,
            RRData::TXT(..) => Type::TXT,
            RRData::Unknown { typ, .. } => typ,
        }
    }

    /// Appends the encoded payload, without the length prefix
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<(), Error> {
        match *self {
            RRData::CNAME(ref name) | RRData::NS(ref name) | RRData::PTR(ref name) => {
                write_name(name, buf)
            }
            RRData::A(ip) => {
                buf.extend_from_slice(&ip.octets());
                Ok(())
            }
            RRData::AAAA(ip) => {
                buf.extend_from_slice(&ip.octets());
                Ok(())
            }
            RRData::SRV {
                priority,
                weight,
                port,
                ref target,
            } => {
                buf.extend_from_slice(&priority.to_be_bytes());
                buf.extend_from_slice(&weight.to_be_bytes());
                buf.extend_from_slice(&port.to_be_bytes());
                write_name(target, buf)
            }
            RRData::MX {
                preference,
                ref exchange,
            } => {
                buf.extend_from_slice(&preference.to_be_bytes());
                write_name(exchange, buf)
            }
            RRData::TXT(ref strings) => {
                for string in strings {
                    if string.len() > usize::from(u8::MAX) {
                        return Err(Error::TextTooLong(string.len()));
                    }
                    buf.push(string.len() as u8);
                    buf.extend_from_slice(string);
                }
                Ok(())
            }
            RRData::Unknown {
                data: Some(ref data),
                ..
            } => {
                buf.extend_from_slice(data);
                Ok(())
            }
            RRData::Unknown { typ, data: None } => Err(Error::UnsupportedRecordType(typ.into())),
        }
    }

    /// Decodes `len` bytes of rdata found at `offset` in `original`.
    ///
    /// Names inside the rdata are resolved against the whole packet since
    /// their compression pointers may lead outside the rdata. Fails with
    /// `TruncatedRecord` when `original` ends before the rdata does.
    pub fn parse(typ: Type, original: &[u8], offset: usize, len: usize) -> Result<RRData, Error> {
        let rdata = offset
            .checked_add(len)
            .and_then(|end| original.get(offset..end))
            .ok_or(Error::TruncatedRecord)?;
        // a name filling the rest of the rdata after `skip` fixed bytes
        let tail_name = |skip: usize| -> Result<String, Error> {
            if len <= skip {
                return Err(Error::WrongRdataLength);
            }
            let (name, consumed) = read_name(original, offset + skip)?;
            if skip + consumed != len {
                return Err(Error::WrongRdataLength);
            }
            Ok(name)
        };

        match typ {
            Type::A => {
                if len != 4 {
                    return Err(Error::WrongRdataLength);
                }
                Ok(RRData::A(Ipv4Addr::from(BigEndian::read_u32(rdata))))
            }
            Type::AAAA => {
                if len != 16 {
                    return Err(Error::WrongRdataLength);
                }
                let mut octets = [0u8; 16];
                octets.copy_from_slice(rdata);
                Ok(RRData::AAAA(Ipv6Addr::from(octets)))
            }
            Type::CNAME => Ok(RRData::CNAME(tail_name(0)?)),
            Type::NS => Ok(RRData::NS(tail_name(0)?)),
            Type::PTR => Ok(RRData::PTR(tail_name(0)?)),
            Type::MX => Ok(RRData::MX {
                exchange: tail_name(2)?,
                preference: BigEndian::read_u16(&rdata[..2]),
            }),
            Type::SRV => Ok(RRData::SRV {
                target: tail_name(6)?,
                priority: BigEndian::read_u16(&rdata[..2]),
                weight: BigEndian::read_u16(&rdata[2..4]),
                port: BigEndian::read_u16(&rdata[4..6]),
            }),
            Type::TXT => {
                let mut strings = Vec::new();
                let mut pos = 0;
                while pos < len {
                    let end = pos + 1 + usize::from(rdata[pos]);
                    if end > len {
                        return Err(Error::WrongRdataLength);
                    }
                    strings.push(rdata[pos + 1..end].to_vec());
                    pos = end;
                }
                Ok(RRData::TXT(strings))
            }
            typ => Ok(RRData::Unknown {
                typ,
                data: Some(rdata.to_vec()),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn encoded(data: &RRData) -> Vec<u8> {
        let mut buf = Vec::new();
        data.write_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn addresses() {
        let a = RRData::A(Ipv4Addr::new(93, 184, 216, 34));
        assert_eq!(encoded(&a), vec![93, 184, 216, 34]);
        assert_eq!(RRData::parse(Type::A, &[93, 184, 216, 34], 0, 4), Ok(a));

        let aaaa = RRData::AAAA("2001:db8::1".parse().unwrap());
        let bytes = encoded(&aaaa);
        assert_eq!(bytes.len(), 16);
        assert_eq!(RRData::parse(Type::AAAA, &bytes, 0, 16), Ok(aaaa));

        assert_eq!(
            RRData::parse(Type::A, &[1, 2, 3], 0, 3),
            Err(Error::WrongRdataLength)
        );
    }

    #[test]
    fn mx_and_srv() {
        let mx = RRData::MX {
            preference: 10,
            exchange: "mail.example.com".to_owned(),
        };
        let bytes = encoded(&mx);
        assert_eq!(&bytes[..], &b"\x00\x0a\x04mail\x07example\x03com\x00"[..]);
        assert_eq!(RRData::parse(Type::MX, &bytes, 0, bytes.len()), Ok(mx));

        let srv = RRData::SRV {
            priority: 1,
            weight: 5,
            port: 5269,
            target: "xmpp.example.com".to_owned(),
        };
        let bytes = encoded(&srv);
        assert_eq!(RRData::parse(Type::SRV, &bytes, 0, bytes.len()), Ok(srv));
        assert_eq!(
            RRData::parse(Type::SRV, &bytes[..6], 0, 6),
            Err(Error::WrongRdataLength)
        );
    }

    #[test]
    fn txt_strings() {
        let txt = RRData::TXT(vec![b"v=spf1 -all".to_vec(), vec![], b"x".to_vec()]);
        let bytes = encoded(&txt);
        assert_eq!(&bytes[..], &b"\x0bv=spf1 -all\x00\x01x"[..]);
        assert_eq!(RRData::parse(Type::TXT, &bytes, 0, bytes.len()), Ok(txt));

        assert_eq!(
            RRData::parse(Type::TXT, b"\x05abc", 0, 4),
            Err(Error::WrongRdataLength)
        );
        let too_long = RRData::TXT(vec![vec![b'a'; 256]]);
        assert_eq!(too_long.write_to(&mut Vec::new()), Err(Error::TextTooLong(256)));
    }

    #[test]
    fn name_in_rdata_points_outside() {
        // rdata at 13 is a bare pointer back to the name at 0
        let packet = b"\x07example\x03com\x00\xc0\x00\x00";
        assert_eq!(
            RRData::parse(Type::CNAME, packet, 13, 2),
            Ok(RRData::CNAME("example.com".to_owned()))
        );
        assert_eq!(
            RRData::parse(Type::CNAME, packet, 13, 3).err(),
            Some(Error::WrongRdataLength)
        );
    }

    #[test]
    fn rdata_past_end_of_buffer() {
        assert_eq!(
            RRData::parse(Type::A, &[1, 2, 3], 0, 4),
            Err(Error::TruncatedRecord)
        );
        assert_eq!(
            RRData::parse(Type::MX, b"\x00", 0, 2),
            Err(Error::TruncatedRecord)
        );
        assert_eq!(
            RRData::parse(Type::TXT, b"\x01a", 3, 0),
            Err(Error::TruncatedRecord)
        );
        assert_eq!(
            RRData::parse(Type::SOA, b"\x01a", usize::MAX, 2),
            Err(Error::TruncatedRecord)
        );
    }

    #[test]
    fn unknown_types_pass_through() {
        let soa = RRData::parse(Type::SOA, b"\x01\x02\x03", 0, 3).unwrap();
        assert_eq!(
            soa,
            RRData::Unknown {
                typ: Type::SOA,
                data: Some(vec![1, 2, 3]),
            }
        );
        assert_eq!(encoded(&soa), vec![1, 2, 3]);

        let empty = RRData::Unknown {
            typ: Type::Unknown(65280),
            data: None,
        };
        assert_eq!(
            empty.write_to(&mut Vec::new()),
            Err(Error::UnsupportedRecordType(65280))
        );
    }
}
