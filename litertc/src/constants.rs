use std::time::Duration;

/// Receive buffer capacity for the media and mDNS sockets. Larger
/// datagrams are truncated by the kernel and rejected as malformed by
/// the per-class parsers.
pub const RX_BUF_CAP: usize = 2048;

/// STUN server used when the embedder does not supply its own list.
pub const DEFAULT_STUN_SERVER: &str = "stun.litertc.rs";

/// Port assumed for STUN servers given as a bare `host`.
pub const DEFAULT_STUN_PORT: u16 = 3478;

/// How long an mDNS resolution of a remote `.local` candidate keeps
/// retrying before it is dropped.
pub const MDNS_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";
