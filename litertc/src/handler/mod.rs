use std::net::SocketAddr;

use shared::error::Error;

pub mod demuxer;
pub mod dtls;
pub mod srtp;
pub mod stun;

/// Error tag returned by a packet sub-handler.
#[derive(Debug)]
pub enum HandlerError {
    /// The event loop logs the error and continues.
    Recoverable(Error),
    /// The event loop logs the error and exits.
    Fatal(Error),
}

/// A sub-handler for one class of media-socket datagram.
///
/// Handlers run on the connection's worker and must not block; they
/// receive the immutable payload and the sender address.
pub trait PacketHandler {
    fn handle_packet(
        &mut self,
        payload: &[u8],
        peer: SocketAddr,
    ) -> std::result::Result<(), HandlerError>;
}
