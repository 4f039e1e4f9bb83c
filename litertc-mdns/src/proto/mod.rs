//! Sans-I/O mDNS responder/resolver.
//!
//! [`Mdns`] holds the protocol state and performs no I/O. The caller
//! reads datagrams from 224.0.0.251:5353 into `handle_read()`, sends
//! everything `poll_write()` yields, calls `handle_timeout()` when the
//! `poll_timeout()` deadline passes, and drains `poll_event()`.
//!
//! As a responder it answers `A` queries for the configured local
//! names with the configured address. `AAAA` queries are recognized
//! but not answered. As a resolver it issues qtype-ANY queries for
//! `.local` hostnames and reports matching `A` answers as events.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use shared::error::{Error, Result};
use shared::{TaggedBytesMut, TransportContext, TransportMessage, TransportProtocol};

use crate::config::{MdnsConfig, DEFAULT_QUERY_INTERVAL, RESPONSE_TTL};
use crate::message;

/// The mDNS multicast group address.
pub const MDNS_MULTICAST_IPV4: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// The standard mDNS port.
pub const MDNS_PORT: u16 = 5353;

/// mDNS multicast destination address (224.0.0.251:5353). All queries
/// and responses are sent here.
pub const MDNS_DEST_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(MDNS_MULTICAST_IPV4), MDNS_PORT);

/// Identifier for tracking queries started with [`Mdns::query`].
pub type QueryId = u64;

/// A pending query and its retry schedule.
#[derive(Debug, Clone)]
pub(crate) struct Query {
    pub(crate) id: QueryId,
    /// Hostname without the implied `.local` suffix.
    pub(crate) hostname: String,
    pub(crate) start_time: Instant,
    pub(crate) next_retry: Instant,
}

/// Events emitted by the connection.
#[derive(Debug)]
pub enum MdnsEvent {
    /// A pending query was answered with the given address.
    QueryAnswered(QueryId, IpAddr),
    /// A pending query exceeded the configured timeout and was dropped.
    QueryTimeout(QueryId),
}

/// Sans-I/O mDNS connection, answering queries for its local names and
/// resolving remote ones.
pub struct Mdns {
    config: MdnsConfig,

    /// Local names normalized to bare hostnames (no `.local`).
    local_names: Vec<String>,

    queries: Vec<Query>,
    next_query_id: QueryId,

    query_interval: Duration,
    query_timeout: Option<Duration>,

    write_outs: VecDeque<TaggedBytesMut>,
    event_outs: VecDeque<MdnsEvent>,

    next_timeout: Option<Instant>,

    closed: bool,
}

impl Mdns {
    pub fn new(config: MdnsConfig) -> Self {
        let local_names = config
            .local_names
            .iter()
            .map(|name| normalize_hostname(name))
            .collect();

        let query_interval = if config.query_interval == Duration::ZERO {
            DEFAULT_QUERY_INTERVAL
        } else {
            config.query_interval
        };
        let query_timeout = config.query_timeout;

        Self {
            config,
            local_names,
            queries: Vec::new(),
            next_query_id: 1,
            query_interval,
            query_timeout,
            write_outs: VecDeque::new(),
            event_outs: VecDeque::new(),
            next_timeout: None,
            closed: false,
        }
    }

    /// Starts a query for the given `.local` hostname.
    ///
    /// The query packet is queued immediately and retried at the
    /// configured interval until answered, timed out, or cancelled.
    pub fn query(&mut self, name: &str) -> QueryId {
        let hostname = normalize_hostname(name);

        let id = self.next_query_id;
        self.next_query_id += 1;

        let now = Instant::now();
        self.queries.push(Query {
            id,
            hostname: hostname.clone(),
            start_time: now,
            next_retry: now + self.query_interval,
        });

        self.send_question(&hostname, now);
        self.update_next_timeout();

        id
    }

    /// Cancels a pending query.
    pub fn cancel_query(&mut self, query_id: QueryId) {
        self.queries.retain(|q| q.id != query_id);
        self.update_next_timeout();
    }

    /// Whether a query is still waiting for an answer.
    pub fn is_query_pending(&self, query_id: QueryId) -> bool {
        self.queries.iter().any(|q| q.id == query_id)
    }

    /// Number of queries still waiting for answers.
    pub fn pending_query_count(&self) -> usize {
        self.queries.len()
    }

    fn send_question(&mut self, hostname: &str, now: Instant) {
        let raw = match message::query_packet(hostname) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("failed to build mDNS query for {hostname}: {err}");
                return;
            }
        };

        log::trace!("queuing mDNS query for {hostname}.local");
        self.write_outs.push_back(TransportMessage {
            now,
            transport: TransportContext {
                local_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
                peer_addr: MDNS_DEST_ADDR,
                transport_protocol: TransportProtocol::UDP,
            },
            message: BytesMut::from(&raw[..]),
        });
    }

    fn send_answer(&mut self, hostname: &str, local_ip: Ipv4Addr, now: Instant) {
        let raw = match message::answer_packet(hostname, local_ip, RESPONSE_TTL) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("failed to build mDNS answer for {hostname}: {err}");
                return;
            }
        };

        log::trace!("queuing mDNS answer for {hostname}.local -> {local_ip}");
        self.write_outs.push_back(TransportMessage {
            now,
            transport: TransportContext {
                local_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), MDNS_PORT),
                peer_addr: MDNS_DEST_ADDR,
                transport_protocol: TransportProtocol::UDP,
            },
            message: BytesMut::from(&raw[..]),
        });
    }

    fn process_message(&mut self, msg: &TaggedBytesMut) {
        let hdr = match message::Header::unpack(&msg.message) {
            Ok(hdr) => hdr,
            Err(_) => {
                log::trace!(
                    "dropping short mDNS packet ({} bytes) from {}",
                    msg.message.len(),
                    msg.transport.peer_addr
                );
                return;
            }
        };

        if hdr.flags & message::FLAG_RESPONSE != 0 {
            self.process_response(msg);
        } else {
            self.process_query(msg);
        }
    }

    fn process_query(&mut self, msg: &TaggedBytesMut) {
        let mut names_to_answer = Vec::new();
        for hostname in &self.local_names {
            match message::validate_query(&msg.message, hostname) {
                Ok(found) => {
                    if found.a {
                        log::debug!("received A query for {hostname}.local");
                        names_to_answer.push(hostname.clone());
                    }
                    if found.aaaa {
                        // recognized, but AAAA answers are not emitted
                        log::debug!("received AAAA query for {hostname}.local");
                    }
                }
                Err(err) => {
                    log::trace!(
                        "ignoring mDNS query from {}: {err}",
                        msg.transport.peer_addr
                    );
                    return;
                }
            }
        }

        if let Some(local_ip) = self.config.local_ip {
            for hostname in names_to_answer {
                self.send_answer(&hostname, local_ip, msg.now);
            }
        } else if !names_to_answer.is_empty() {
            log::warn!("matching mDNS query received but no local_ip configured");
        }
    }

    fn process_response(&mut self, msg: &TaggedBytesMut) {
        let records = match message::answer_a_records(&msg.message) {
            Ok(records) => records,
            Err(err) => {
                log::trace!(
                    "ignoring mDNS response from {}: {err}",
                    msg.transport.peer_addr
                );
                return;
            }
        };

        for record in records {
            let mut answered = Vec::new();
            for query in &self.queries {
                if message::name_matches(&msg.message, record.name_off, &query.hostname) {
                    answered.push(query.id);
                }
            }
            for id in answered {
                log::debug!("mDNS query {id} answered: {}", record.addr);
                self.event_outs
                    .push_back(MdnsEvent::QueryAnswered(id, IpAddr::V4(record.addr)));
                self.queries.retain(|q| q.id != id);
            }
        }

        self.update_next_timeout();
    }

    fn update_next_timeout(&mut self) {
        self.next_timeout = self.queries.iter().map(|q| q.next_retry).min();
    }
}

impl sansio::Protocol<TaggedBytesMut, (), ()> for Mdns {
    type Rout = ();
    type Wout = TaggedBytesMut;
    type Eout = MdnsEvent;
    type Error = Error;
    type Time = Instant;

    /// Processes a datagram received on the multicast socket: queries
    /// for local names queue answer packets, responses matching
    /// pending queries emit events.
    fn handle_read(&mut self, msg: TaggedBytesMut) -> Result<()> {
        if self.closed {
            return Err(Error::ErrConnectionClosed);
        }
        self.process_message(&msg);
        Ok(())
    }

    /// mDNS produces no read outputs; answers arrive via `poll_event()`.
    fn poll_read(&mut self) -> Option<Self::Rout> {
        None
    }

    /// Unused; queries are initiated via [`Mdns::query`].
    fn handle_write(&mut self, _msg: ()) -> Result<()> {
        Ok(())
    }

    /// Next packet to send to [`MDNS_DEST_ADDR`], if any.
    fn poll_write(&mut self) -> Option<Self::Wout> {
        self.write_outs.pop_front()
    }

    /// Unused; mDNS consumes no external events.
    fn handle_event(&mut self, _evt: ()) -> Result<()> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.event_outs.pop_front()
    }

    /// Retries pending queries whose retry time has passed and expires
    /// those that exceeded the configured timeout.
    fn handle_timeout(&mut self, now: Self::Time) -> Result<()> {
        if self.closed {
            return Err(Error::ErrConnectionClosed);
        }

        let due = match self.next_timeout {
            Some(next_timeout) => next_timeout <= now,
            None => false,
        };
        if due {
            if let Some(timeout) = self.query_timeout {
                let mut timed_out = Vec::new();
                for query in &self.queries {
                    if now.duration_since(query.start_time) >= timeout {
                        timed_out.push(query.id);
                    }
                }
                for id in timed_out {
                    log::debug!("mDNS query {id} timed out");
                    self.event_outs.push_back(MdnsEvent::QueryTimeout(id));
                    self.queries.retain(|q| q.id != id);
                }
            }

            let mut names_to_query = Vec::new();
            for query in &mut self.queries {
                if query.next_retry <= now {
                    names_to_query.push(query.hostname.clone());
                    query.next_retry = now + self.query_interval;
                }
            }
            for hostname in names_to_query {
                self.send_question(&hostname, now);
            }

            self.update_next_timeout();
        }

        Ok(())
    }

    /// Deadline at which `handle_timeout()` wants to run next.
    fn poll_timeout(&mut self) -> Option<Self::Time> {
        self.next_timeout
    }

    /// Drops all pending queries and queued output. Subsequent reads
    /// and timeouts fail with [`Error::ErrConnectionClosed`].
    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.queries.clear();
        self.write_outs.clear();
        self.event_outs.clear();
        self.next_timeout = None;
        Ok(())
    }
}

/// Strips a trailing dot and `.local` suffix, leaving the bare hostname.
fn normalize_hostname(name: &str) -> String {
    let name = name.strip_suffix('.').unwrap_or(name);
    let name = name.strip_suffix(".local").unwrap_or(name);
    name.to_owned()
}

#[cfg(test)]
mod mdns_test;
