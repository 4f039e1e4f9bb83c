use std::net::SocketAddr;

use log::debug;

use crate::handler::{HandlerError, PacketHandler};

/// DTLS records are forwarded to the embedder's handshake engine;
/// none is wired in yet, so the handler only accounts for them.
#[derive(Default)]
pub struct DtlsHandler;

impl DtlsHandler {
    pub fn new() -> Self {
        DtlsHandler
    }
}

impl PacketHandler for DtlsHandler {
    fn handle_packet(
        &mut self,
        payload: &[u8],
        peer: SocketAddr,
    ) -> std::result::Result<(), HandlerError> {
        debug!("[dtls] {} bytes from {peer}", payload.len());
        Ok(())
    }
}
