use std::net::SocketAddr;

use log::debug;

use crate::handler::{HandlerError, PacketHandler};

/// STUN packets reach the media socket once candidates are exchanged.
/// The full agent state machine is an external collaborator; this
/// handler only accounts for the traffic.
#[derive(Default)]
pub struct StunHandler;

impl StunHandler {
    pub fn new() -> Self {
        StunHandler
    }
}

impl PacketHandler for StunHandler {
    fn handle_packet(
        &mut self,
        payload: &[u8],
        peer: SocketAddr,
    ) -> std::result::Result<(), HandlerError> {
        debug!("[stun] {} bytes from {peer}", payload.len());
        Ok(())
    }
}
