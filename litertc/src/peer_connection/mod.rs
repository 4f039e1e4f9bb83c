//! The peer connection: sockets, worker, and the signaling surface.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use log::{info, warn};
use mio::{Interest, Poll, Waker};
use uuid::Uuid;

use mdns::{Mdns, MdnsConfig, MulticastSocket};
use shared::error::{Error, Result};

pub mod configuration;
pub(crate) mod ice_candidate;
pub mod sdp;
pub mod state;
pub(crate) mod worker;

use configuration::RTCConfiguration;
use sdp::RTCSessionDescription;
use state::RTCSignalingState;
use worker::{AdvisoryState, Command, Worker, MDNS_TOKEN, MEDIA_TOKEN, WAKER_TOKEN};

/// Invoked on the worker with each local ICE candidate, then with
/// `None` for end-of-candidates. Must not block.
pub type OnIceCandidateHdlrFn = Box<dyn FnMut(Option<String>) + Send>;

/// Invoked on the worker when the remote peer requests a keyframe.
/// Wired to the embedder's encoder.
pub type OnForceIdrHdlrFn = Box<dyn FnMut() + Send>;

/// A peer connection.
///
/// Creating one allocates the UDP media socket, joins the mDNS
/// multicast group on a second socket, generates the ephemeral
/// `<uuid>.local` hostname, and spawns the per-connection worker.
/// All mutable state lives on the worker; this handle carries the
/// immutable identity, the worker inbox, and a read-only state mirror.
///
/// Dropping the handle tears the connection down; [`close`](Self::close)
/// does so explicitly and is idempotent.
pub struct RTCPeerConnection {
    configuration: RTCConfiguration,
    mdns_hostname: String,
    local_addr: SocketAddr,
    sender: Sender<Command>,
    waker: Arc<Waker>,
    worker: Option<JoinHandle<()>>,
    advisory: Arc<Mutex<AdvisoryState>>,
    closed: bool,
}

impl RTCPeerConnection {
    /// Creates a peer connection and starts its worker.
    ///
    /// Initialization failures (socket creation, multicast join,
    /// thread spawn) release everything acquired so far and surface
    /// the error.
    pub fn new(configuration: RTCConfiguration) -> Result<RTCPeerConnection> {
        let media_std = std::net::UdpSocket::bind("0.0.0.0:0")?;
        media_std.set_nonblocking(true)?;
        let local_addr = media_std.local_addr()?;
        let mut media_socket = mio::net::UdpSocket::from_std(media_std);

        let mdns_hostname = Uuid::new_v4().to_string();
        info!("mDNS hostname is {mdns_hostname}.local");

        let mdns_std = MulticastSocket::new().into_std()?;
        let mut mdns_socket = mio::net::UdpSocket::from_std(mdns_std);

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut media_socket, MEDIA_TOKEN, Interest::READABLE)?;
        poll.registry()
            .register(&mut mdns_socket, MDNS_TOKEN, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER_TOKEN)?);

        let mut mdns_config = MdnsConfig::default()
            .with_local_names(vec![mdns_hostname.clone()])
            .with_query_timeout(crate::constants::MDNS_QUERY_TIMEOUT);
        match shared::ifaces::first_nonloopback_ipv4() {
            Ok(ip) => mdns_config = mdns_config.with_local_ip(ip),
            Err(err) => warn!("queries will go unanswered, no interface address: {err}"),
        }
        let mdns = Mdns::new(mdns_config);

        let fingerprint = configuration
            .certificate_fingerprint
            .unwrap_or_else(rand::random::<[u8; 32]>);

        let (sender, receiver) = crossbeam_channel::unbounded();
        let advisory = Arc::new(Mutex::new(AdvisoryState::default()));

        let worker = Worker::new(
            poll,
            media_socket,
            mdns_socket,
            receiver,
            mdns,
            mdns_hostname.clone(),
            local_addr.port(),
            fingerprint,
            Arc::clone(&advisory),
        );
        let handle = std::thread::Builder::new()
            .name("litertc-worker".to_owned())
            .spawn(move || worker.run())?;

        Ok(RTCPeerConnection {
            configuration,
            mdns_hostname,
            local_addr,
            sender,
            waker,
            worker: Some(handle),
            advisory,
            closed: false,
        })
    }

    /// Sets the callback receiving local ICE candidates.
    pub fn set_on_ice_candidate(&self, callback: OnIceCandidateHdlrFn) -> Result<()> {
        self.send(Command::SetOnIceCandidate(callback))
    }

    /// Sets the callback the (external) RTCP feedback path uses to
    /// request an IDR frame from the encoder.
    pub fn set_on_force_idr(&self, callback: OnForceIdrHdlrFn) -> Result<()> {
        self.send(Command::SetOnForceIdr(callback))
    }

    /// Applies a local description, advancing the signaling state.
    pub fn set_local_description(&self, desc: RTCSessionDescription) -> Result<()> {
        self.request(|reply| Command::SetLocalDescription(desc, reply))
    }

    /// Applies a remote description, advancing the signaling state.
    pub fn set_remote_description(&self, desc: RTCSessionDescription) -> Result<()> {
        self.request(|reply| Command::SetRemoteDescription(desc, reply))
    }

    /// Creates an offer describing this endpoint.
    pub fn create_offer(&self) -> Result<RTCSessionDescription> {
        self.request(Command::CreateOffer)
    }

    /// Creates an answer to the applied remote offer. Fails without a
    /// remote description, or when the remote video section names no
    /// supported codec.
    pub fn create_answer(&self) -> Result<RTCSessionDescription> {
        self.request(Command::CreateAnswer)
    }

    /// Adds a remote ICE candidate. `None` or an empty string denotes
    /// end-of-candidates. Candidates with `.local` hostnames start an
    /// mDNS resolution on the worker.
    pub fn add_ice_candidate(&self, candidate: Option<&str>) -> Result<()> {
        let candidate = candidate.map(str::to_owned);
        self.request(|reply| Command::AddIceCandidate(candidate, reply))
    }

    /// Current signaling state. Advisory read; never blocks on the worker.
    pub fn signaling_state(&self) -> RTCSignalingState {
        self.advisory
            .lock()
            .map(|advisory| advisory.signaling_state)
            .unwrap_or_default()
    }

    /// Last applied local description, if any.
    pub fn local_description(&self) -> Option<RTCSessionDescription> {
        self.advisory
            .lock()
            .ok()
            .and_then(|advisory| advisory.local_description.clone())
    }

    /// Last applied remote description, if any.
    pub fn remote_description(&self) -> Option<RTCSessionDescription> {
        self.advisory
            .lock()
            .ok()
            .and_then(|advisory| advisory.remote_description.clone())
    }

    /// The ephemeral hostname (without `.local`) this connection
    /// publishes over mDNS. Immutable after creation.
    pub fn mdns_hostname(&self) -> &str {
        &self.mdns_hostname
    }

    /// Local address of the media socket.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The configuration this connection was created with.
    pub fn configuration(&self) -> &RTCConfiguration {
        &self.configuration
    }

    /// Tears the connection down: signals the worker, waits for it to
    /// exit, releases the multicast membership, and closes both
    /// sockets. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let _ = self.sender.send(Command::Close);
        let _ = self.waker.wake();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        Ok(())
    }

    fn send(&self, command: Command) -> Result<()> {
        if self.closed {
            return Err(Error::ErrConnectionClosed);
        }
        self.sender
            .send(command)
            .map_err(|_| Error::ErrConnectionClosed)?;
        self.waker.wake()?;
        Ok(())
    }

    fn request<T>(
        &self,
        build: impl FnOnce(Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (reply, response) = crossbeam_channel::bounded(1);
        self.send(build(reply))?;
        response.recv().map_err(|_| Error::ErrConnectionClosed)?
    }
}

impl Drop for RTCPeerConnection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
