//! A small iterative DNS resolver: wire codec, UDP transport, a TTL-aware
//! LRU answer cache, and the referral-walking resolver that ties them
//! together.
pub mod cache;
pub mod error;
#[macro_use]
pub mod macros;
pub mod resolver;
pub mod transport;
pub mod util;
pub mod wire;

pub use error::{DNSError, DNSResult};
pub use resolver::{resolve, resolve_cached, resolve_with_ttl, DnsResult, ROOT_SERVERS};
pub use wire::QType;
