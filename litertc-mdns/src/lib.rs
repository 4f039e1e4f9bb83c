//! # litertc-mdns
//!
//! A sans-I/O mDNS responder and resolver, scoped to what a WebRTC
//! peer connection needs: answering `A`/`AAAA` queries for an
//! ephemeral `<uuid>.local` hostname, and resolving the `.local`
//! hostnames found in remote ICE candidates.
//!
//! The protocol core ([`Mdns`]) implements [`sansio::Protocol`] and
//! performs no I/O itself. The caller reads datagrams from the
//! multicast socket and feeds them to `handle_read()`, sends whatever
//! `poll_write()` returns, drives retries through `handle_timeout()`,
//! and consumes answers from `poll_event()`:
//!
//! ```rust
//! use litertc_mdns::{Mdns, MdnsConfig};
//! use sansio::Protocol;
//! use std::net::Ipv4Addr;
//!
//! let config = MdnsConfig::default()
//!     .with_local_names(vec!["9d63d29c-8d6a-42d3-9ebe-7a1dbd38eb2c".to_string()])
//!     .with_local_ip(Ipv4Addr::new(192, 168, 1, 10));
//! let mut conn = Mdns::new(config);
//!
//! // Resolve a remote .local hostname.
//! let query_id = conn.query("28c9b66c-46b9-4c9a-bb0c-57a9a1ea7dfd.local");
//! let packet = conn.poll_write().expect("query packet queued");
//! assert_eq!(packet.transport.peer_addr.to_string(), "224.0.0.251:5353");
//! # assert!(conn.is_query_pending(query_id));
//! ```
//!
//! [`MulticastSocket`] builds the properly configured UDP socket
//! (address reuse, loopback off, group membership) for the caller's
//! event loop.

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub(crate) mod config;
pub(crate) mod message;
pub(crate) mod proto;
pub(crate) mod socket;

pub use config::MdnsConfig;
pub use message::{parse_response, validate_query, QueryMatch};
pub use proto::{Mdns, MdnsEvent, QueryId, MDNS_DEST_ADDR, MDNS_MULTICAST_IPV4, MDNS_PORT};
pub use socket::MulticastSocket;
