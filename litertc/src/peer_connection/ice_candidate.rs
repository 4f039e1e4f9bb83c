//! ICE candidate string helpers.
//!
//! The connection emits exactly one local candidate: a host candidate
//! whose connection address is the ephemeral `<uuid>.local` hostname,
//! so no interface address leaks before consent. Remote candidates
//! are accepted as opaque strings; only the connection address is
//! extracted, to detect `.local` hostnames that need mDNS resolution.

/// Recommended type preference for host candidates (RFC 8445).
const HOST_CANDIDATE_PRIORITY: u32 = 2_130_706_431;

/// Builds the local host candidate embedding the mDNS hostname and
/// the media socket port.
pub(crate) fn host_candidate(hostname: &str, port: u16) -> String {
    format!("candidate:0 1 udp {HOST_CANDIDATE_PRIORITY} {hostname}.local {port} typ host")
}

/// Extracts the connection address of a candidate string:
/// `candidate:<foundation> <component> <transport> <priority> <address> <port> typ <type> ...`
///
/// The leading `candidate:` tag is optional, as some signaling stacks
/// strip it.
pub(crate) fn connection_address(candidate: &str) -> Option<&str> {
    let raw = candidate.strip_prefix("candidate:").unwrap_or(candidate);
    let mut tokens = raw.split_whitespace();
    let _foundation = tokens.next()?;
    let _component = tokens.next()?;
    let _transport = tokens.next()?;
    let _priority = tokens.next()?;
    tokens.next()
}
