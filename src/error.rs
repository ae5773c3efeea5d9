//! A dedicated error for all possible errors in DNS queries: I/O, DNS packet
//! inconsistencies, etc. Every failure kind the rest of the crate can raise is
//! represented here so callers can match on it instead of parsing strings.
use std::fmt;
use std::io;
use std::str;

#[derive(Debug)]
pub enum DNSError {
    /// encoding was asked to produce a name with a label over 63 bytes, or whose
    /// total wire length (labels + length octets + terminator) exceeds 255
    InvalidName,
    /// a response packet failed to parse: short header, an offset out of range,
    /// a compression pointer loop, or an rdlength that runs past the buffer
    MalformedPacket(String),
    /// socket creation, bind, sendto, or a non-timeout recv failed
    Transport(io::Error),
    /// the configured receive deadline elapsed before a reply arrived
    Timeout,
    /// the server answered with RCODE=3
    NxDomain,
    /// the nameserver list was exhausted without producing an answer
    Exhausted,
    FromUtf8(std::string::FromUtf8Error),
    Utf8(str::Utf8Error),
    LoggerError(log::SetLoggerError),
    DNS(String),
}

impl DNSError {
    // Helper function to create a new DNS error from a string
    pub fn new(s: &str) -> Self {
        DNSError::DNS(String::from(s))
    }

    pub fn malformed(s: impl Into<String>) -> Self {
        DNSError::MalformedPacket(s.into())
    }
}

impl fmt::Display for DNSError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DNSError::InvalidName => write!(f, "invalid domain name"),
            DNSError::MalformedPacket(s) => write!(f, "malformed DNS packet: {}", s),
            DNSError::Transport(e) => write!(f, "transport error: {}", e),
            DNSError::Timeout => write!(f, "timed out waiting for a response"),
            DNSError::NxDomain => write!(f, "name does not exist"),
            DNSError::Exhausted => write!(f, "nameserver list exhausted"),
            DNSError::FromUtf8(e) => write!(f, "invalid utf8 in label: {}", e),
            DNSError::Utf8(e) => write!(f, "invalid utf8 in label: {}", e),
            DNSError::LoggerError(e) => write!(f, "logger already initialized: {}", e),
            DNSError::DNS(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for DNSError {}

/// A specific custom `Result` for all functions
pub type DNSResult<T> = Result<T, DNSError>;

// All conversions for internal errors into DNSError
impl From<io::Error> for DNSError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => DNSError::Timeout,
            _ => DNSError::Transport(err),
        }
    }
}

impl From<String> for DNSError {
    fn from(err: String) -> Self {
        DNSError::DNS(err)
    }
}

impl From<std::string::FromUtf8Error> for DNSError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        DNSError::FromUtf8(err)
    }
}

impl From<str::Utf8Error> for DNSError {
    fn from(err: str::Utf8Error) -> Self {
        DNSError::Utf8(err)
    }
}

impl From<log::SetLoggerError> for DNSError {
    fn from(err: log::SetLoggerError) -> Self {
        DNSError::LoggerError(err)
    }
}
