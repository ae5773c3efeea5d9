//! DNS header fields and the RR type/class codes this resolver knows about.
//! Modeled as plain Rust enums rather than the teacher's `DnsEnum`-derived,
//! `#[repr(u16)]` style, since the set of codes we need to round-trip is small
//! and fixed; unrecognized codes fall through to an explicit `Unknown` arm
//! instead of failing to parse.
use std::fmt;

/// RR TYPE / QTYPE codes, RFC 1035 §3.2.2 and RFC 3596.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QType {
    A,
    NS,
    CNAME,
    MX,
    AAAA,
    /// any other TYPE/QTYPE code, carried verbatim so skip_rr can still advance
    Unknown(u16),
}

impl QType {
    pub fn code(self) -> u16 {
        match self {
            QType::A => 1,
            QType::NS => 2,
            QType::CNAME => 5,
            QType::MX => 15,
            QType::AAAA => 28,
            QType::Unknown(c) => c,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            1 => QType::A,
            2 => QType::NS,
            5 => QType::CNAME,
            15 => QType::MX,
            28 => QType::AAAA,
            other => QType::Unknown(other),
        }
    }

    /// Whether `self` should be accepted as an answer to a query asking for
    /// `expected`. `Unknown(0)` is the "any recognized type" wildcard. A
    /// CNAME is always accepted regardless of `expected` (other than the
    /// wildcard, which already accepts it): a name with a CNAME answers every
    /// query type with just the alias, leaving the caller to chase it.
    pub fn matches(self, expected: QType) -> bool {
        if self == QType::CNAME && expected != QType::Unknown(0) {
            return true;
        }
        match expected {
            QType::Unknown(0) => !matches!(self, QType::Unknown(_)),
            QType::A | QType::AAAA => matches!(self, QType::A | QType::AAAA),
            _ => self == expected,
        }
    }
}

impl fmt::Display for QType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QType::A => write!(f, "A"),
            QType::NS => write!(f, "NS"),
            QType::CNAME => write!(f, "CNAME"),
            QType::MX => write!(f, "MX"),
            QType::AAAA => write!(f, "AAAA"),
            QType::Unknown(c) => write!(f, "TYPE{}", c),
        }
    }
}

impl std::str::FromStr for QType {
    type Err = crate::error::DNSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(QType::A),
            "NS" => Ok(QType::NS),
            "CNAME" => Ok(QType::CNAME),
            "MX" => Ok(QType::MX),
            "AAAA" => Ok(QType::AAAA),
            other => Err(crate::error::DNSError::new(&format!(
                "unsupported record type \"{}\"",
                other
            ))),
        }
    }
}

/// RR CLASS / QCLASS. The resolver only ever sends and accepts IN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QClass {
    IN,
    Unknown(u16),
}

impl QClass {
    pub fn code(self) -> u16 {
        match self {
            QClass::IN => 1,
            QClass::Unknown(c) => c,
        }
    }

    pub fn from_code(code: u16) -> Self {
        match code {
            1 => QClass::IN,
            other => QClass::Unknown(other),
        }
    }
}

/// The 4-bit RCODE carried in the low bits of the flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    Other(u8),
}

impl ResponseCode {
    pub fn from_code(code: u8) -> Self {
        match code & 0x0F {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NxDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            other => ResponseCode::Other(other),
        }
    }
}
