//! Configuration for mDNS connections.

use std::net::Ipv4Addr;
use std::time::Duration;

/// Default interval between query retries.
pub(crate) const DEFAULT_QUERY_INTERVAL: Duration = Duration::from_secs(1);

/// TTL carried by response records, per RFC 6762's recommendation.
pub(crate) const RESPONSE_TTL: u32 = 120;

/// Configuration for an mDNS connection.
///
/// A responder needs `local_names` and `local_ip`; a resolver needs
/// neither and just issues [`query()`](crate::Mdns::query) calls. One
/// connection may do both.
#[derive(Clone, Debug)]
pub struct MdnsConfig {
    /// How often an unanswered query is retried.
    ///
    /// Zero falls back to the default of one second.
    pub query_interval: Duration,

    /// Maximum time a query waits for an answer before a
    /// [`MdnsEvent::QueryTimeout`](crate::MdnsEvent::QueryTimeout) is
    /// emitted and the query dropped. `None` retries indefinitely.
    pub query_timeout: Option<Duration>,

    /// Hostnames this connection answers `A` queries for, without the
    /// `.local` suffix (it is implied on the wire).
    pub local_names: Vec<String>,

    /// IPv4 address advertised in answer records. Required for a
    /// responder; queries for `local_names` go unanswered without it.
    pub local_ip: Option<Ipv4Addr>,
}

impl Default for MdnsConfig {
    fn default() -> Self {
        Self {
            query_interval: DEFAULT_QUERY_INTERVAL,
            query_timeout: None,
            local_names: Vec::new(),
            local_ip: None,
        }
    }
}

impl MdnsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the query retry interval.
    pub fn with_query_interval(mut self, interval: Duration) -> Self {
        self.query_interval = interval;
        self
    }

    /// Sets the query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Sets the hostnames to answer queries for. A trailing `.local`
    /// or dot is stripped.
    pub fn with_local_names(mut self, names: Vec<String>) -> Self {
        self.local_names = names;
        self
    }

    /// Sets the IPv4 address advertised in answers.
    pub fn with_local_ip(mut self, ip: Ipv4Addr) -> Self {
        self.local_ip = Some(ip);
        self
    }
}
