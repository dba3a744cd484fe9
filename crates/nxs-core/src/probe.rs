//! Port/lock probe
//!
//! A port counts as bound when a bind attempt on the wildcard address fails
//! with "address in use". This catches listeners on any interface, including
//! loopback-only ones, and is the same query the agent's own bind would make.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener};

use crate::traits::PortProbe;

/// Probe backed by real socket binds
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketProbe;

impl SocketProbe {
    fn in_use(addr: SocketAddr) -> bool {
        match TcpListener::bind(addr) {
            Ok(_) => false,
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => true,
            // e.g. no IPv6 on this host
            Err(e) => {
                tracing::debug!("Cannot probe {}: {}", addr, e);
                false
            }
        }
    }
}

impl PortProbe for SocketProbe {
    fn is_bound(&self, port: u16) -> bool {
        Self::in_use(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
            || Self::in_use(SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listening_port_is_bound() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(SocketProbe.is_bound(port));
    }

    #[test]
    fn test_released_port_is_free() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(!SocketProbe.is_bound(port));
    }
}
