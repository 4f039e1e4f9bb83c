//! Network interface enumeration.
//!
//! The mDNS responder advertises the IPv4 address of the first
//! non-loopback interface; this module is the single place that
//! knowledge of the host's interfaces lives.

use std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// Returns the IPv4 address of the first non-loopback `AF_INET`
/// interface reported by the host.
#[cfg(not(windows))]
pub fn first_nonloopback_ipv4() -> Result<Ipv4Addr> {
    use nix::ifaddrs::getifaddrs;
    use nix::net::if_::InterfaceFlags;

    let addrs = getifaddrs().map_err(|e| Error::Other(e.to_string()))?;
    for ifaddr in addrs {
        if ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK) {
            continue;
        }
        if let Some(address) = ifaddr.address {
            if let Some(sin) = address.as_sockaddr_in() {
                return Ok(Ipv4Addr::from(sin.ip()));
            }
        }
    }

    Err(Error::ErrNoInterface)
}

#[cfg(windows)]
pub fn first_nonloopback_ipv4() -> Result<Ipv4Addr> {
    Err(Error::ErrNoInterface)
}
