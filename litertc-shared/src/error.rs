#![allow(dead_code)]

use std::io;
use std::num::ParseIntError;
use std::string::FromUtf8Error;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Closed error set shared by every litertc crate.
///
/// Parse errors carry the most specific tag available; nothing is
/// partially committed to the target value when one is returned.
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("bad argument")]
    ErrBadArgument,
    #[error("insufficient memory")]
    ErrInsufficientMemory,
    #[error("malformed")]
    ErrMalformed,
    #[error("not implemented")]
    ErrNotImplemented,

    #[error("peer connection: remote description missing")]
    ErrPeerConnMissingRemoteDescription,

    // SDP codec errors
    #[error("sdp: malformed")]
    ErrSdpMalformed,
    #[error("sdp: malformed version line")]
    ErrSdpMalformedVersion,
    #[error("sdp: malformed origin line")]
    ErrSdpMalformedOrigin,
    #[error("sdp: malformed timing line")]
    ErrSdpMalformedTiming,
    #[error("sdp: malformed media description")]
    ErrSdpMalformedMedia,
    #[error("sdp: malformed attribute")]
    ErrSdpMalformedAttribute,
    #[error("sdp: unsupported fingerprint algorithm")]
    ErrSdpUnsupportedFingerprintAlgo,
    #[error("sdp: unsupported media protocol")]
    ErrSdpUnsupportedMediaProtocol,
    #[error("sdp: unsupported media type")]
    ErrSdpUnsupportedMediaType,

    // signaling state machine errors
    #[error("signaling state: cannot rollback from stable")]
    ErrSignalingStateCannotRollback,
    #[error("signaling state: invalid proposed transition: {0}")]
    ErrSignalingStateProposedTransitionInvalid(String),

    // connection lifecycle errors
    #[error("connection closed")]
    ErrConnectionClosed,
    #[error("no interface is available")]
    ErrNoInterface,

    #[error("parse int: {0}")]
    ParseInt(#[from] ParseIntError),
    #[error("utf8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("{0}")]
    Io(#[source] IoError),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Error::Other(e.to_string())
    }
}
