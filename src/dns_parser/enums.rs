use std::fmt;
use std::str::FromStr;

macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident : $repr:ty {
            $($variant:ident = $code:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(clippy::upper_case_acronyms)]
        pub enum $name {
            $($variant,)*
            /// A code without a symbolic name, carried through unchanged
            Unknown($repr),
        }

        impl From<$repr> for $name {
            fn from(code: $repr) -> $name {
                match code {
                    $($code => $name::$variant,)*
                    other => $name::Unknown(other),
                }
            }
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> $repr {
                match value {
                    $($name::$variant => $code,)*
                    $name::Unknown(other) => other,
                }
            }
        }
    };
}

code_enum! {
    /// Record and query types
    pub enum Type: u16 {
        A = 1,
        NS = 2,
        CNAME = 5,
        SOA = 6,
        PTR = 12,
        MX = 15,
        TXT = 16,
        AAAA = 28,
        SRV = 33,
        OPT = 41,
        ANY = 255,
    }
}

code_enum! {
    /// Record and query classes
    pub enum Class: u16 {
        IN = 1,
        CS = 2,
        CH = 3,
        HS = 4,
        ANY = 255,
    }
}

code_enum! {
    /// The 4-bit OPCODE of the header
    pub enum Opcode: u8 {
        StandardQuery = 0,
        InverseQuery = 1,
        ServerStatusRequest = 2,
    }
}

code_enum! {
    /// The 4-bit RCODE of the header
    pub enum ResponseCode: u8 {
        NoError = 0,
        FormatError = 1,
        ServerFailure = 2,
        NameError = 3,
        NotImplemented = 4,
        Refused = 5,
    }
}

const TYPE_NAMES: &[(&str, Type)] = &[
    ("A", Type::A),
    ("NS", Type::NS),
    ("CNAME", Type::CNAME),
    ("SOA", Type::SOA),
    ("PTR", Type::PTR),
    ("MX", Type::MX),
    ("TXT", Type::TXT),
    ("AAAA", Type::AAAA),
    ("SRV", Type::SRV),
    ("OPT", Type::OPT),
    ("ANY", Type::ANY),
];

const CLASS_NAMES: &[(&str, Class)] = &[
    ("IN", Class::IN),
    ("CS", Class::CS),
    ("CH", Class::CH),
    ("HS", Class::HS),
    ("ANY", Class::ANY),
];

/// Returned when a symbolic type or class name is not in the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown name {:?}", self.0)
    }
}

impl std::error::Error for UnknownName {}

impl FromStr for Type {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Type, UnknownName> {
        TYPE_NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, typ)| typ)
            .ok_or_else(|| UnknownName(s.to_owned()))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match TYPE_NAMES.iter().find(|(_, typ)| typ == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "TYPE{}", u16::from(*self)),
        }
    }
}

impl FromStr for Class {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Class, UnknownName> {
        CLASS_NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, cls)| cls)
            .ok_or_else(|| UnknownName(s.to_owned()))
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match CLASS_NAMES.iter().find(|(_, cls)| cls == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "CLASS{}", u16::from(*self)),
        }
    }
}
