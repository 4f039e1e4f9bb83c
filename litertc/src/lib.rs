//! # litertc
//!
//! A lightweight peer-to-peer real-time communication library for
//! resource-constrained devices that need a browser-compatible media
//! channel without a full WebRTC stack.
//!
//! Each [`RTCPeerConnection`](peer_connection::RTCPeerConnection)
//! owns a UDP media socket and an mDNS multicast socket, publishes an
//! ephemeral `<uuid>.local` hostname, and runs a dedicated worker
//! that multiplexes both sockets: media datagrams are classified as
//! STUN, DTLS, or SRTP/SRTCP by first byte, and mDNS queries for the
//! ephemeral hostname are answered. The embedder drives signaling by
//! exchanging [`RTCSessionDescription`](peer_connection::sdp::RTCSessionDescription)s
//! over its own transport.
//!
//! ```no_run
//! use litertc::peer_connection::configuration::RTCConfiguration;
//! use litertc::peer_connection::sdp::RTCSessionDescription;
//! use litertc::peer_connection::RTCPeerConnection;
//!
//! # fn main() -> Result<(), shared::error::Error> {
//! let mut pc = RTCPeerConnection::new(RTCConfiguration::default())?;
//!
//! // received from the remote peer over the signaling channel
//! # let remote_sdp = String::new();
//! pc.set_remote_description(RTCSessionDescription::offer(remote_sdp)?)?;
//! let answer = pc.create_answer()?;
//! pc.set_local_description(answer.clone())?;
//! // ship `answer.sdp` back over the signaling channel
//!
//! pc.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod constants;
pub mod handler;
pub mod messages;
pub mod peer_connection;

pub use peer_connection::configuration::RTCConfiguration;
pub use peer_connection::sdp::{RTCSdpType, RTCSessionDescription};
pub use peer_connection::state::RTCSignalingState;
pub use peer_connection::RTCPeerConnection;
