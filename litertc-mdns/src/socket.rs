//! Multicast socket builder for mDNS.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};

use crate::proto::{MDNS_MULTICAST_IPV4, MDNS_PORT};

/// Builds the UDP socket a peer connection serves mDNS on.
///
/// The resulting socket is:
///
/// - bound to `0.0.0.0:5353` (or the configured port),
/// - configured with `SO_REUSEADDR`, and `SO_REUSEPORT` where the
///   platform has it, so concurrent peer connections on one host each
///   receive the multicast stream,
/// - joined to the 224.0.0.251 group with multicast loopback disabled,
/// - set non-blocking, ready for a readiness-based event loop.
#[derive(Debug, Clone)]
pub struct MulticastSocket {
    port: u16,
    interface: Option<Ipv4Addr>,
}

impl Default for MulticastSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl MulticastSocket {
    pub fn new() -> Self {
        Self {
            port: MDNS_PORT,
            interface: None,
        }
    }

    /// Overrides the bind port. Useful for tests; mDNS proper lives on
    /// port 5353.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Joins the multicast group on a specific interface instead of
    /// `INADDR_ANY`.
    pub fn with_interface(mut self, interface: Ipv4Addr) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Creates the configured `std::net::UdpSocket`.
    ///
    /// # Errors
    ///
    /// Any failure along socket creation, option setting, bind, or
    /// group join is returned; nothing is left half-open.
    pub fn into_std(self) -> io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

        socket.set_reuse_address(true)?;
        #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
        socket.set_reuse_port(true)?;

        socket.set_nonblocking(true)?;

        // the connection must not consume its own answers
        socket.set_multicast_loop_v4(false)?;

        let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port);
        socket.bind(&bind_addr.into())?;

        let iface = self.interface.unwrap_or(Ipv4Addr::UNSPECIFIED);
        socket.join_multicast_v4(&MDNS_MULTICAST_IPV4, &iface)?;

        Ok(socket.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multicast_constants() {
        assert_eq!(MDNS_MULTICAST_IPV4, Ipv4Addr::new(224, 0, 0, 251));
        assert_eq!(MDNS_PORT, 5353);
    }

    #[test]
    fn test_builder_defaults() {
        let builder = MulticastSocket::new();
        assert_eq!(builder.port, MDNS_PORT);
        assert!(builder.interface.is_none());
    }

    #[test]
    fn test_builder_with_interface() {
        let interface = Ipv4Addr::new(192, 168, 1, 100);
        let builder = MulticastSocket::new().with_interface(interface);
        assert_eq!(builder.interface, Some(interface));
    }

    // Socket creation itself is exercised by the peer-connection
    // integration tests; creating group memberships here would race
    // with other mDNS services on the host.
}
