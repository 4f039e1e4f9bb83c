//! Per-connection event loop.
//!
//! One worker thread owns all mutable connection state: both sockets,
//! the mDNS protocol core, the signaling state machine, and the user
//! callbacks. It blocks only in the poll wait; public API calls
//! enqueue [`Command`]s through the inbox and unblock the wait with a
//! [`mio::Waker`], so the worker exits at a well-defined point on
//! teardown.

use std::collections::HashMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use bytes::BytesMut;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use log::{debug, error, info, trace, warn};
use mio::net::UdpSocket;
use mio::{Events, Poll, Token};
use sansio::Protocol;

use mdns::{Mdns, MdnsEvent, QueryId, MDNS_MULTICAST_IPV4, MDNS_PORT};
use sdp::{
    Codec, Direction, IceParameters, MediaDescription, Origin, RtpMap, SessionDescription, Timing,
};
use shared::error::{Error, Result};
use shared::{TaggedBytesMut, TransportContext, TransportProtocol};

use crate::constants::RX_BUF_CAP;
use crate::handler::demuxer;
use crate::handler::dtls::DtlsHandler;
use crate::handler::srtp::SrtpHandler;
use crate::handler::stun::StunHandler;
use crate::handler::{HandlerError, PacketHandler};
use crate::messages::MediaMessage;
use crate::peer_connection::ice_candidate;
use crate::peer_connection::sdp::RTCSessionDescription;
use crate::peer_connection::state::signaling_state::{
    check_next_signaling_state, proposed_state, StateChangeOp,
};
use crate::peer_connection::state::RTCSignalingState;
use crate::peer_connection::{OnForceIdrHdlrFn, OnIceCandidateHdlrFn};

pub(crate) const MEDIA_TOKEN: Token = Token(0);
pub(crate) const MDNS_TOKEN: Token = Token(1);
pub(crate) const WAKER_TOKEN: Token = Token(2);

/// Work enqueued by the public API. Commands carrying a reply sender
/// rendezvous with the caller.
pub(crate) enum Command {
    SetLocalDescription(RTCSessionDescription, Sender<Result<()>>),
    SetRemoteDescription(RTCSessionDescription, Sender<Result<()>>),
    CreateOffer(Sender<Result<RTCSessionDescription>>),
    CreateAnswer(Sender<Result<RTCSessionDescription>>),
    AddIceCandidate(Option<String>, Sender<Result<()>>),
    SetOnIceCandidate(OnIceCandidateHdlrFn),
    SetOnForceIdr(OnForceIdrHdlrFn),
    Close,
}

/// State mirror the public handle reads without blocking on the worker.
#[derive(Default)]
pub(crate) struct AdvisoryState {
    pub(crate) signaling_state: RTCSignalingState,
    pub(crate) local_description: Option<RTCSessionDescription>,
    pub(crate) remote_description: Option<RTCSessionDescription>,
}

pub(crate) struct Worker {
    poll: Poll,
    media_socket: UdpSocket,
    mdns_socket: UdpSocket,
    commands: Receiver<Command>,

    mdns: Mdns,
    hostname: String,
    media_port: u16,
    fingerprint: [u8; 32],
    ice: IceParameters,

    signaling_state: RTCSignalingState,
    local_description: Option<RTCSessionDescription>,
    remote_description: Option<RTCSessionDescription>,
    advisory: Arc<Mutex<AdvisoryState>>,

    on_ice_candidate: Option<OnIceCandidateHdlrFn>,
    on_force_idr: Option<OnForceIdrHdlrFn>,
    candidates_emitted: bool,

    remote_candidates: Vec<String>,
    pending_resolutions: HashMap<QueryId, String>,
    resolved_candidates: Vec<(String, std::net::IpAddr)>,

    stun: StunHandler,
    dtls: DtlsHandler,
    srtp: SrtpHandler,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        poll: Poll,
        media_socket: UdpSocket,
        mdns_socket: UdpSocket,
        commands: Receiver<Command>,
        mdns: Mdns,
        hostname: String,
        media_port: u16,
        fingerprint: [u8; 32],
        advisory: Arc<Mutex<AdvisoryState>>,
    ) -> Self {
        let ice = IceParameters {
            ufrag: sdp::util::rand_alphanumeric(sdp::util::ICE_UFRAG_LEN),
            pwd: sdp::util::rand_alphanumeric(sdp::util::ICE_PWD_LEN),
            trickle: true,
        };

        Self {
            poll,
            media_socket,
            mdns_socket,
            commands,
            mdns,
            hostname,
            media_port,
            fingerprint,
            ice,
            signaling_state: RTCSignalingState::Stable,
            local_description: None,
            remote_description: None,
            advisory,
            on_ice_candidate: None,
            on_force_idr: None,
            candidates_emitted: false,
            remote_candidates: Vec::new(),
            pending_resolutions: HashMap::new(),
            resolved_candidates: Vec::new(),
            stun: StunHandler::new(),
            dtls: DtlsHandler::new(),
            srtp: SrtpHandler::new(),
        }
    }

    pub(crate) fn run(mut self) {
        let mut events = Events::with_capacity(16);
        let mut buf = [0u8; RX_BUF_CAP];

        loop {
            let timeout = self
                .mdns
                .poll_timeout()
                .map(|deadline| deadline.saturating_duration_since(Instant::now()));

            if let Err(err) = self.poll.poll(&mut events, timeout) {
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                error!("poll failed, stopping worker: {err}");
                break;
            }

            let mut fatal = false;
            for event in events.iter() {
                match event.token() {
                    MEDIA_TOKEN => {
                        if !self.read_media(&mut buf) {
                            fatal = true;
                        }
                    }
                    MDNS_TOKEN => self.read_mdns(&mut buf),
                    // the waker only interrupts the wait; commands are
                    // drained below on every iteration
                    WAKER_TOKEN => {}
                    _ => {}
                }
            }
            if fatal {
                break;
            }

            loop {
                match self.commands.try_recv() {
                    Ok(Command::Close) => {
                        self.shutdown();
                        return;
                    }
                    Ok(command) => self.handle_command(command),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.shutdown();
                        return;
                    }
                }
            }

            let _ = self.mdns.handle_timeout(Instant::now());
            self.flush_mdns();
        }

        self.shutdown();
    }

    /// Reads and dispatches media datagrams until the socket would
    /// block. Returns false when a handler reports a fatal error.
    fn read_media(&mut self, buf: &mut [u8]) -> bool {
        loop {
            match self.media_socket.recv_from(buf) {
                Ok((n, peer)) => {
                    let result = match demuxer::classify(&buf[..n]) {
                        Some(MediaMessage::Stun(payload)) => {
                            self.stun.handle_packet(&payload, peer)
                        }
                        Some(MediaMessage::Dtls(payload)) => {
                            self.dtls.handle_packet(&payload, peer)
                        }
                        Some(MediaMessage::Rtp(payload)) => {
                            self.srtp.handle_packet(&payload, peer)
                        }
                        None => {
                            trace!("discarding unclassified datagram from {peer}");
                            Ok(())
                        }
                    };

                    match result {
                        Ok(()) => {}
                        Err(HandlerError::Recoverable(err)) => {
                            warn!("recoverable handler error from {peer}: {err}");
                        }
                        Err(HandlerError::Fatal(err)) => {
                            error!("fatal handler error from {peer}: {err}");
                            return false;
                        }
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    // recovered locally; the loop continues
                    warn!("media socket read error: {err}");
                    break;
                }
            }
        }
        true
    }

    fn read_mdns(&mut self, buf: &mut [u8]) {
        loop {
            match self.mdns_socket.recv_from(buf) {
                Ok((n, peer)) => {
                    let msg = TaggedBytesMut {
                        now: Instant::now(),
                        transport: TransportContext {
                            local_addr: SocketAddr::new(
                                Ipv4Addr::UNSPECIFIED.into(),
                                MDNS_PORT,
                            ),
                            peer_addr: peer,
                            transport_protocol: TransportProtocol::UDP,
                        },
                        message: BytesMut::from(&buf[..n]),
                    };
                    if let Err(err) = self.mdns.handle_read(msg) {
                        warn!("mdns read error: {err}");
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    warn!("mdns socket read error: {err}");
                    break;
                }
            }
        }
        self.flush_mdns();
    }

    /// Sends queued mDNS packets and consumes resolver events.
    fn flush_mdns(&mut self) {
        while let Some(packet) = self.mdns.poll_write() {
            if let Err(err) = self
                .mdns_socket
                .send_to(&packet.message, packet.transport.peer_addr)
            {
                warn!("mdns send error: {err}");
            }
        }

        while let Some(event) = self.mdns.poll_event() {
            match event {
                MdnsEvent::QueryAnswered(id, addr) => {
                    if let Some(candidate) = self.pending_resolutions.remove(&id) {
                        info!("resolved remote candidate host to {addr}");
                        self.resolved_candidates.push((candidate, addr));
                    }
                }
                MdnsEvent::QueryTimeout(id) => {
                    if let Some(candidate) = self.pending_resolutions.remove(&id) {
                        warn!("mdns resolution timed out for candidate {candidate}");
                    }
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetLocalDescription(desc, reply) => {
                let result = self.set_local_description(desc);
                let _ = reply.send(result);
            }
            Command::SetRemoteDescription(desc, reply) => {
                let result = self.set_remote_description(desc);
                let _ = reply.send(result);
            }
            Command::CreateOffer(reply) => {
                let _ = reply.send(self.create_offer());
            }
            Command::CreateAnswer(reply) => {
                let _ = reply.send(self.create_answer());
            }
            Command::AddIceCandidate(candidate, reply) => {
                let result = self.add_ice_candidate(candidate);
                let _ = reply.send(result);
            }
            Command::SetOnIceCandidate(callback) => {
                self.on_ice_candidate = Some(callback);
            }
            Command::SetOnForceIdr(callback) => {
                self.on_force_idr = Some(callback);
            }
            // handled by the run loop before dispatch
            Command::Close => {}
        }
    }

    fn set_local_description(&mut self, desc: RTCSessionDescription) -> Result<()> {
        desc.parsed()?;

        let next = proposed_state(StateChangeOp::SetLocal, desc.sdp_type);
        self.signaling_state = check_next_signaling_state(
            self.signaling_state,
            next,
            StateChangeOp::SetLocal,
            desc.sdp_type,
        )?;
        debug!("signaling state -> {}", self.signaling_state);

        self.local_description = Some(desc);
        self.publish_advisory();
        self.emit_local_candidates();
        Ok(())
    }

    fn set_remote_description(&mut self, desc: RTCSessionDescription) -> Result<()> {
        desc.parsed()?;

        let next = proposed_state(StateChangeOp::SetRemote, desc.sdp_type);
        self.signaling_state = check_next_signaling_state(
            self.signaling_state,
            next,
            StateChangeOp::SetRemote,
            desc.sdp_type,
        )?;
        debug!("signaling state -> {}", self.signaling_state);

        self.remote_description = Some(desc);
        self.publish_advisory();
        Ok(())
    }

    fn create_offer(&mut self) -> Result<RTCSessionDescription> {
        let rtpmaps = vec![RtpMap {
            payload_type: 96,
            codec: Some(Codec::H264),
            clock_rate: 90000,
        }];
        let description = self.new_local_description(
            Direction::SendOnly,
            rtpmaps,
            true,
            true,
            vec!["0".to_owned()],
        );
        RTCSessionDescription::offer(description.marshal())
    }

    fn create_answer(&mut self) -> Result<RTCSessionDescription> {
        let remote = self
            .remote_description
            .as_ref()
            .ok_or(Error::ErrPeerConnMissingRemoteDescription)?;
        let parsed = remote.parsed()?;

        let video = parsed
            .video
            .as_ref()
            .ok_or(Error::ErrSdpUnsupportedMediaType)?;
        let rtpmaps: Vec<RtpMap> = video
            .payload_types_for(Codec::H264)
            .copied()
            .collect();
        if rtpmaps.is_empty() {
            // the remote offer names no codec this endpoint can produce
            return Err(Error::ErrSdpUnsupportedMediaType);
        }

        let bundle_mids = if parsed.bundle_mids.is_empty() {
            vec!["0".to_owned()]
        } else {
            parsed.bundle_mids.clone()
        };

        let description = self.new_local_description(
            parsed.direction.reverse(),
            rtpmaps,
            parsed.rtcp_mux,
            parsed.rtcp_rsize,
            bundle_mids,
        );
        RTCSessionDescription::answer(description.marshal())
    }

    fn add_ice_candidate(&mut self, candidate: Option<String>) -> Result<()> {
        let candidate = match candidate {
            Some(candidate) if !candidate.is_empty() => candidate,
            // empty or absent candidate denotes end-of-candidates
            _ => {
                debug!("end of remote candidates");
                return Ok(());
            }
        };

        if self.remote_description.is_none() {
            return Err(Error::ErrPeerConnMissingRemoteDescription);
        }

        let address =
            ice_candidate::connection_address(&candidate).ok_or(Error::ErrMalformed)?;
        if address.ends_with(".local") {
            let id = self.mdns.query(address);
            self.pending_resolutions.insert(id, candidate.clone());
            self.flush_mdns();
        }

        self.remote_candidates.push(candidate);
        Ok(())
    }

    fn new_local_description(
        &self,
        direction: Direction,
        rtpmaps: Vec<RtpMap>,
        rtcp_mux: bool,
        rtcp_rsize: bool,
        bundle_mids: Vec<String>,
    ) -> SessionDescription {
        SessionDescription {
            version: 0,
            origin: Origin {
                username: "-".to_owned(),
                session_id: sdp::util::new_session_id().to_string(),
                session_version: "2".to_owned(),
            },
            session_name: String::new(),
            timing: Timing { start: 0, stop: 0 },
            bundle_mids,
            ice: self.ice.clone(),
            fingerprint: self.fingerprint,
            direction,
            rtcp_mux,
            rtcp_rsize,
            video: Some(MediaDescription {
                port: 9,
                rtpmaps,
            }),
            audio: None,
        }
    }

    /// Invokes `on_ice_candidate` with the single host candidate and
    /// the end-of-candidates marker. The candidate never changes, so
    /// it is emitted once per connection.
    fn emit_local_candidates(&mut self) {
        if self.candidates_emitted {
            return;
        }
        if let Some(callback) = self.on_ice_candidate.as_mut() {
            let candidate = ice_candidate::host_candidate(&self.hostname, self.media_port);
            callback(Some(candidate));
            callback(None);
            self.candidates_emitted = true;
        }
    }

    fn publish_advisory(&self) {
        if let Ok(mut advisory) = self.advisory.lock() {
            advisory.signaling_state = self.signaling_state;
            advisory.local_description = self.local_description.clone();
            advisory.remote_description = self.remote_description.clone();
        }
    }

    fn shutdown(&mut self) {
        let _ = self.mdns.close();
        if let Err(err) = self
            .mdns_socket
            .leave_multicast_v4(&MDNS_MULTICAST_IPV4, &Ipv4Addr::UNSPECIFIED)
        {
            debug!("leaving multicast group failed: {err}");
        }
        debug!("worker for {}.local stopped", self.hostname);
        // both sockets close on drop
    }
}
