//! # litertc-sdp
//!
//! A codec for the restricted SDP dialect used by WebRTC offer/answer
//! exchanges. It recognizes only what the dialect needs: a single
//! BUNDLE group, the `UDP/TLS/RTP/SAVPF` profile, SHA-256 DTLS
//! fingerprints, and at most one audio and one video media section.
//!
//! Parsing is total: any input string either produces a
//! [`SessionDescription`] or a specific error tag, and nothing is
//! partially committed on failure. Unknown line types and unknown
//! attributes are silently ignored, as interoperability requires.
//!
//! ```rust
//! use litertc_sdp::SessionDescription;
//!
//! let sdp = SessionDescription::unmarshal("v=0\no=- 42 2 IN IP4 127.0.0.1\nt=0 0\n").unwrap();
//! assert_eq!(sdp.version, 0);
//! assert_eq!(sdp.origin.session_id, "42");
//! ```

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod description;
pub mod direction;
pub mod util;

pub(crate) mod lexer;

pub use description::{
    media::{Codec, MediaDescription, RtpMap},
    session::{IceParameters, Origin, SessionDescription, Timing},
};
pub use direction::Direction;
