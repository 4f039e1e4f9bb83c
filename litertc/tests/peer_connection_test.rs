use std::sync::mpsc;
use std::time::Duration;

use litertc::{RTCConfiguration, RTCPeerConnection, RTCSessionDescription, RTCSignalingState};
use shared::error::Error;

/// `XXXXXXXX-XXXX-4XXX-[89ab]XXX-XXXXXXXXXXXX`, lowercase hex.
fn assert_uuid_shape(s: &str) {
    assert_eq!(s.len(), 36, "hostname {s:?} has wrong length");
    for (i, b) in s.bytes().enumerate() {
        match i {
            8 | 13 | 18 | 23 => assert_eq!(b, b'-', "byte {i} of {s:?}"),
            14 => assert_eq!(b, b'4', "version nibble of {s:?}"),
            19 => assert!(
                matches!(b, b'8' | b'9' | b'a' | b'b'),
                "variant nibble of {s:?}"
            ),
            _ => assert!(
                b.is_ascii_digit() || (b'a'..=b'f').contains(&b),
                "byte {i} of {s:?}"
            ),
        }
    }
}

#[test]
fn test_create_with_default_configuration() {
    let mut pc = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();

    // callers passing no list get the single-entry vendor default
    assert_eq!(
        pc.configuration().stun_servers,
        vec!["stun.litertc.rs".to_owned()]
    );
    assert_eq!(
        pc.configuration().stun_server_addrs(),
        vec![("stun.litertc.rs".to_owned(), 3478)]
    );

    assert_uuid_shape(pc.mdns_hostname());
    assert_ne!(pc.local_addr().port(), 0);
    assert_eq!(pc.signaling_state(), RTCSignalingState::Stable);
    assert!(pc.local_description().is_none());
    assert!(pc.remote_description().is_none());

    pc.close().unwrap();
    // close is idempotent
    pc.close().unwrap();
}

#[test]
fn test_hostnames_are_unique_per_connection() {
    let mut pc1 = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();
    let mut pc2 = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();

    assert_ne!(pc1.mdns_hostname(), pc2.mdns_hostname());

    pc1.close().unwrap();
    pc2.close().unwrap();
}

#[test]
fn test_offer_answer_exchange() {
    let mut offerer = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();
    let mut answerer = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();

    let offer = offerer.create_offer().unwrap();
    assert!(offer.sdp.contains("m=video 9 UDP/TLS/RTP/SAVPF 96"));
    assert!(offer.sdp.contains("a=rtpmap:96 H264/90000"));
    assert!(offer.sdp.contains("a=ice-options:trickle"));

    offerer.set_local_description(offer.clone()).unwrap();
    assert_eq!(
        offerer.signaling_state(),
        RTCSignalingState::HaveLocalOffer
    );

    answerer
        .set_remote_description(RTCSessionDescription::offer(offer.sdp.clone()).unwrap())
        .unwrap();
    assert_eq!(
        answerer.signaling_state(),
        RTCSignalingState::HaveRemoteOffer
    );

    let answer = answerer.create_answer().unwrap();
    // the offer is send-only video, so the answer receives
    assert!(answer.sdp.contains("a=recvonly"));
    assert!(answer.sdp.contains("a=rtpmap:96 H264/90000"));

    answerer.set_local_description(answer.clone()).unwrap();
    assert_eq!(answerer.signaling_state(), RTCSignalingState::Stable);

    offerer
        .set_remote_description(RTCSessionDescription::answer(answer.sdp.clone()).unwrap())
        .unwrap();
    assert_eq!(offerer.signaling_state(), RTCSignalingState::Stable);

    assert_eq!(offerer.local_description(), Some(offer));
    assert_eq!(answerer.local_description(), Some(answer));

    offerer.close().unwrap();
    answerer.close().unwrap();
}

#[test]
fn test_create_answer_requires_remote_description() {
    let mut pc = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();

    assert_eq!(
        pc.create_answer().unwrap_err(),
        Error::ErrPeerConnMissingRemoteDescription
    );

    pc.close().unwrap();
}

#[test]
fn test_create_answer_rejects_unsupported_codecs() {
    let mut pc = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();

    // VP8-only offer: parses fine, but no codec this endpoint produces
    let offer = "v=0\n\
                 o=- 42 2 IN IP4 127.0.0.1\n\
                 s=-\n\
                 t=0 0\n\
                 m=video 9 UDP/TLS/RTP/SAVPF 100\n\
                 a=ice-ufrag:abcd\n\
                 a=ice-pwd:abcdefghijklmnopqrstuvwx\n\
                 a=rtpmap:100 VP8/90000\n";
    pc.set_remote_description(RTCSessionDescription::offer(offer.to_string()).unwrap())
        .unwrap();

    assert_eq!(
        pc.create_answer().unwrap_err(),
        Error::ErrSdpUnsupportedMediaType
    );

    pc.close().unwrap();
}

#[test]
fn test_invalid_signaling_transition() {
    let mut pc = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();

    let offer = pc.create_offer().unwrap();
    let answer = RTCSessionDescription::answer(offer.sdp).unwrap();
    let result = pc.set_local_description(answer);
    assert!(matches!(
        result,
        Err(Error::ErrSignalingStateProposedTransitionInvalid(_))
    ));
    assert_eq!(pc.signaling_state(), RTCSignalingState::Stable);

    pc.close().unwrap();
}

#[test]
fn test_on_ice_candidate_emits_local_hostname() {
    let mut pc = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();
    let hostname = pc.mdns_hostname().to_owned();
    let port = pc.local_addr().port();

    let (tx, rx) = mpsc::channel();
    pc.set_on_ice_candidate(Box::new(move |candidate| {
        let _ = tx.send(candidate);
    }))
    .unwrap();

    let offer = pc.create_offer().unwrap();
    pc.set_local_description(offer).unwrap();

    let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    let candidate = first.expect("expected a candidate before end-of-candidates");
    assert!(candidate.contains(&format!("{hostname}.local")));
    assert!(candidate.contains(&format!(" {port} ")));
    assert!(candidate.ends_with("typ host"));

    let end = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(end.is_none(), "expected end-of-candidates");

    pc.close().unwrap();
}

#[test]
fn test_add_ice_candidate() {
    let mut pc = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();

    // end-of-candidates is accepted at any time
    pc.add_ice_candidate(None).unwrap();
    pc.add_ice_candidate(Some("")).unwrap();

    // real candidates need a remote description first
    assert_eq!(
        pc.add_ice_candidate(Some(
            "candidate:0 1 udp 2130706431 192.168.1.7 50000 typ host"
        ))
        .unwrap_err(),
        Error::ErrPeerConnMissingRemoteDescription
    );

    let offer = "v=0\n\
                 o=- 42 2 IN IP4 127.0.0.1\n\
                 s=-\n\
                 t=0 0\n\
                 m=video 9 UDP/TLS/RTP/SAVPF 102\n\
                 a=ice-ufrag:abcd\n\
                 a=ice-pwd:abcdefghijklmnopqrstuvwx\n\
                 a=rtpmap:102 H264/90000\n";
    pc.set_remote_description(RTCSessionDescription::offer(offer.to_string()).unwrap())
        .unwrap();

    pc.add_ice_candidate(Some(
        "candidate:0 1 udp 2130706431 192.168.1.7 50000 typ host",
    ))
    .unwrap();

    // a .local candidate starts an mDNS resolution on the worker
    pc.add_ice_candidate(Some(
        "candidate:0 1 udp 2130706431 28c9b66c-46b9-4c9a-bb0c-57a9a1ea7dfd.local 50000 typ host",
    ))
    .unwrap();

    assert_eq!(
        pc.add_ice_candidate(Some("candidate:0 1 udp")).unwrap_err(),
        Error::ErrMalformed
    );

    pc.close().unwrap();
}

#[test]
fn test_calls_after_close_fail() {
    let mut pc = RTCPeerConnection::new(RTCConfiguration::default()).unwrap();
    pc.close().unwrap();

    assert_eq!(pc.create_offer().unwrap_err(), Error::ErrConnectionClosed);
    assert_eq!(
        pc.add_ice_candidate(None).unwrap_err(),
        Error::ErrConnectionClosed
    );
}
