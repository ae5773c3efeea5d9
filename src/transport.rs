//! UDP send/receive, grounded on the teacher's split between building a
//! packet and getting it onto the wire: a small `Transport` trait that the
//! resolver calls through, and a `UdpSocket`-backed implementation for real
//! use. The trait exists so resolver tests can script responses instead of
//! talking to a real network (§8 scenarios S1-S7).
use std::net::{IpAddr, UdpSocket};
use std::time::Duration;

use log::debug;

use crate::error::{DNSError, DNSResult};

/// Maximum size of a DNS-over-UDP response this resolver will accept.
pub const MAX_UDP_RESPONSE: usize = 512;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Something that can send a DNS query to a server and return its response.
pub trait Transport {
    fn send_and_recv(&self, server: IpAddr, query: &[u8]) -> DNSResult<Vec<u8>>;
}

/// Real UDP transport: bind an ephemeral port, send, wait for one datagram
/// with a read timeout, then let the socket drop (closing the fd).
pub struct UdpTransport {
    port: u16,
    timeout: Duration,
}

impl UdpTransport {
    pub fn new() -> Self {
        UdpTransport { port: 53, timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        UdpTransport { port: 53, timeout }
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UdpTransport {
    fn send_and_recv(&self, server: IpAddr, query: &[u8]) -> DNSResult<Vec<u8>> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(Some(self.timeout))?;
        socket.connect((server, self.port))?;
        socket.send(query)?;

        let mut buf = [0u8; MAX_UDP_RESPONSE];
        let len = match socket.recv(&mut buf) {
            Ok(len) => len,
            Err(e) => return Err(DNSError::from(e)),
        };
        debug!("received {} bytes from {}: {}", len, server, format_buffer!("X", &buf[..len]));
        Ok(buf[..len].to_vec())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scripted transport for resolver tests: each server address has its own
    /// queue of canned responses, returned in order regardless of the query
    /// bytes sent to it.
    pub struct MockTransport {
        responses: RefCell<HashMap<IpAddr, Vec<DNSResult<Vec<u8>>>>>,
        calls: RefCell<Vec<IpAddr>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            MockTransport {
                responses: RefCell::new(HashMap::new()),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn queue(&self, server: IpAddr, response: Vec<u8>) {
            self.responses.borrow_mut().entry(server).or_default().push(Ok(response));
        }

        pub fn queue_timeout(&self, server: IpAddr) {
            self.responses
                .borrow_mut()
                .entry(server)
                .or_default()
                .push(Err(DNSError::Timeout));
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl Transport for MockTransport {
        fn send_and_recv(&self, server: IpAddr, _query: &[u8]) -> DNSResult<Vec<u8>> {
            self.calls.borrow_mut().push(server);
            let mut map = self.responses.borrow_mut();
            let queue = map.get_mut(&server).ok_or(DNSError::Timeout)?;
            if queue.is_empty() {
                return Err(DNSError::Timeout);
            }
            queue.remove(0)
        }
    }
}
