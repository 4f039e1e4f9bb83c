use std::net::SocketAddr;

use log::debug;

use crate::handler::{HandlerError, PacketHandler};

/// SRTP and SRTCP share the [128..191] first-byte range and are
/// decrypted by the embedder's SRTP codec once keys are derived.
#[derive(Default)]
pub struct SrtpHandler;

impl SrtpHandler {
    pub fn new() -> Self {
        SrtpHandler
    }
}

impl PacketHandler for SrtpHandler {
    fn handle_packet(
        &mut self,
        payload: &[u8],
        peer: SocketAddr,
    ) -> std::result::Result<(), HandlerError> {
        debug!("[rtp] {} bytes from {peer}", payload.len());
        Ok(())
    }
}
