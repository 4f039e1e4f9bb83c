use super::*;
use crate::message;
use sansio::Protocol;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

fn tagged(payload: &[u8]) -> TaggedBytesMut {
    TaggedBytesMut {
        now: Instant::now(),
        transport: TransportContext {
            local_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), MDNS_PORT),
            peer_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 7)), MDNS_PORT),
            transport_protocol: TransportProtocol::UDP,
        },
        message: BytesMut::from(payload),
    }
}

fn a_query_for(hostname: &str) -> Vec<u8> {
    let mut out = Vec::new();
    message::Header {
        questions: 1,
        ..Default::default()
    }
    .pack(&mut out);
    let label = hostname.as_bytes();
    out.push(label.len() as u8);
    out.extend_from_slice(label);
    out.extend_from_slice(b"\x05local\x00");
    out.extend_from_slice(&message::TYPE_A.to_be_bytes());
    out.extend_from_slice(&message::CLASS_INTERNET.to_be_bytes());
    out
}

// Response blob used by the resolver tests: one echoed question for
// camera1.local and one A answer (192.168.1.100) behind a name pointer.
fn a_response_for_camera1() -> Vec<u8> {
    let mut out = Vec::new();
    message::Header {
        flags: message::FLAG_RESPONSE | message::FLAG_AUTHORITATIVE,
        questions: 1,
        answers: 1,
        ..Default::default()
    }
    .pack(&mut out);
    out.extend_from_slice(b"\x07camera1\x05local\x00");
    out.extend_from_slice(&[0x00, 0xff, 0x80, 0x01]); // qtype any, qclass unicast|in
    out.extend_from_slice(&[0xC0, 0x0C]); // name pointer to the question
    out.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]); // type A, class in
    out.extend_from_slice(&[0x00, 0x00, 0x00, 0x0a]); // ttl
    out.extend_from_slice(&[0x00, 0x04, 0xc0, 0xa8, 0x01, 0x64]); // rdata
    out
}

#[test]
fn test_mdns_query() {
    let mut conn = Mdns::new(MdnsConfig::default());

    let query_id = conn.query("test.local");
    assert!(conn.is_query_pending(query_id));
    assert_eq!(conn.pending_query_count(), 1);

    let packet = conn.poll_write().expect("query packet should be queued");
    assert_eq!(packet.transport.peer_addr, MDNS_DEST_ADDR);
    assert_eq!(
        &packet.message[..],
        &message::query_packet("test").unwrap()[..]
    );
}

#[test]
fn test_mdns_cancel_query() {
    let mut conn = Mdns::new(MdnsConfig::default());

    let query_id = conn.query("test.local");
    assert!(conn.is_query_pending(query_id));

    conn.cancel_query(query_id);
    assert!(!conn.is_query_pending(query_id));
    assert_eq!(conn.pending_query_count(), 0);
}

#[test]
fn test_multiple_queries() {
    let mut conn = Mdns::new(MdnsConfig::default());

    let query1 = conn.query("host1.local");
    let query2 = conn.query("host2.local");
    let query3 = conn.query("host3.local");

    assert_eq!(conn.pending_query_count(), 3);

    assert!(conn.poll_write().is_some());
    assert!(conn.poll_write().is_some());
    assert!(conn.poll_write().is_some());
    assert!(conn.poll_write().is_none());

    conn.cancel_query(query2);
    assert_eq!(conn.pending_query_count(), 2);
    assert!(conn.is_query_pending(query1));
    assert!(!conn.is_query_pending(query2));
    assert!(conn.is_query_pending(query3));
}

#[test]
fn test_local_name_normalization() {
    let config = MdnsConfig::default().with_local_names(vec![
        "host1".to_string(),
        "host2.local".to_string(),
        "host3.local.".to_string(),
    ]);
    let conn = Mdns::new(config);
    assert_eq!(conn.local_names, vec!["host1", "host2", "host3"]);
}

#[test]
fn test_close_rejects_further_io() {
    let mut conn = Mdns::new(MdnsConfig::default());
    conn.query("host.local");
    assert!(conn.close().is_ok());

    assert_eq!(conn.pending_query_count(), 0);
    assert!(conn.poll_write().is_none());
    assert!(conn.poll_event().is_none());
    assert!(conn.poll_timeout().is_none());

    assert_eq!(
        conn.handle_read(tagged(&a_query_for("host"))),
        Err(Error::ErrConnectionClosed)
    );
    assert_eq!(
        conn.handle_timeout(Instant::now()),
        Err(Error::ErrConnectionClosed)
    );
}

#[test]
fn test_query_retry() {
    let config = MdnsConfig::default().with_query_interval(Duration::from_millis(100));
    let mut conn = Mdns::new(config);

    let query_id = conn.query("slow.local");
    assert!(conn.poll_write().is_some());
    assert!(conn.poll_write().is_none());

    let retry_at = Instant::now() + Duration::from_millis(150);
    conn.handle_timeout(retry_at).unwrap();

    let packet = conn.poll_write().expect("retry packet should be queued");
    assert_eq!(packet.transport.peer_addr, MDNS_DEST_ADDR);
    assert!(conn.is_query_pending(query_id));
}

#[test]
fn test_query_timeout_emits_event() {
    let config = MdnsConfig::default()
        .with_query_interval(Duration::from_millis(100))
        .with_query_timeout(Duration::from_millis(250));
    let mut conn = Mdns::new(config);

    let query_id = conn.query("timeout-test.local");
    conn.poll_write();

    let now = Instant::now();
    conn.handle_timeout(now + Duration::from_millis(150)).unwrap();
    assert!(conn.is_query_pending(query_id));
    assert!(conn.poll_event().is_none());

    conn.handle_timeout(now + Duration::from_millis(300)).unwrap();
    assert!(!conn.is_query_pending(query_id));

    match conn.poll_event() {
        Some(MdnsEvent::QueryTimeout(id)) => assert_eq!(id, query_id),
        other => panic!("expected QueryTimeout, got {other:?}"),
    }
    assert!(conn.poll_event().is_none());
}

#[test]
fn test_no_timeout_without_config() {
    let config = MdnsConfig::default().with_query_interval(Duration::from_millis(100));
    let mut conn = Mdns::new(config);

    let query_id = conn.query("no-timeout.local");
    conn.poll_write();

    conn.handle_timeout(Instant::now() + Duration::from_secs(3600))
        .unwrap();

    assert!(conn.is_query_pending(query_id));
    assert!(conn.poll_event().is_none());
}

#[test]
fn test_poll_timeout() {
    let mut conn = Mdns::new(MdnsConfig::default());
    assert!(conn.poll_timeout().is_none());

    conn.query("device.local");
    assert!(conn.poll_timeout().is_some());
}

#[test]
fn test_responder_answers_a_query() {
    let config = MdnsConfig::default()
        .with_local_names(vec!["myhost".to_string()])
        .with_local_ip(Ipv4Addr::new(192, 168, 1, 100));
    let mut conn = Mdns::new(config);

    conn.handle_read(tagged(&a_query_for("myhost"))).unwrap();

    let packet = conn.poll_write().expect("answer should be queued");
    assert_eq!(packet.transport.peer_addr, MDNS_DEST_ADDR);
    assert_eq!(
        &packet.message[..],
        &message::answer_packet("myhost", Ipv4Addr::new(192, 168, 1, 100), 120).unwrap()[..]
    );
    assert!(conn.poll_write().is_none());
}

#[test]
fn test_responder_ignores_other_hostnames() {
    let config = MdnsConfig::default()
        .with_local_names(vec!["myhost".to_string()])
        .with_local_ip(Ipv4Addr::new(192, 168, 1, 100));
    let mut conn = Mdns::new(config);

    conn.handle_read(tagged(&a_query_for("otherhost"))).unwrap();
    assert!(conn.poll_write().is_none());
}

#[test]
fn test_responder_without_local_ip_stays_silent() {
    let config = MdnsConfig::default().with_local_names(vec!["myhost".to_string()]);
    let mut conn = Mdns::new(config);

    conn.handle_read(tagged(&a_query_for("myhost"))).unwrap();
    assert!(conn.poll_write().is_none());
}

#[test]
fn test_responder_drops_malformed_packets() {
    let config = MdnsConfig::default()
        .with_local_names(vec!["myhost".to_string()])
        .with_local_ip(Ipv4Addr::new(192, 168, 1, 100));
    let mut conn = Mdns::new(config);

    // handle_read recovers locally on malformed input
    conn.handle_read(tagged(&[0x01, 0x02, 0x03])).unwrap();
    assert!(conn.poll_write().is_none());

    let mut bad_id = a_query_for("myhost");
    bad_id[1] = 0x99;
    conn.handle_read(tagged(&bad_id)).unwrap();
    assert!(conn.poll_write().is_none());
}

#[test]
fn test_resolver_query_answered() {
    let mut conn = Mdns::new(MdnsConfig::default());

    let query_id = conn.query("camera1.local");
    conn.poll_write();

    conn.handle_read(tagged(&a_response_for_camera1())).unwrap();

    match conn.poll_event() {
        Some(MdnsEvent::QueryAnswered(id, addr)) => {
            assert_eq!(id, query_id);
            assert_eq!(addr, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)));
        }
        other => panic!("expected QueryAnswered, got {other:?}"),
    }
    assert!(!conn.is_query_pending(query_id));
    assert!(conn.poll_timeout().is_none());
}

#[test]
fn test_resolver_ignores_unrelated_response() {
    let mut conn = Mdns::new(MdnsConfig::default());

    let query_id = conn.query("someone-else.local");
    conn.poll_write();

    conn.handle_read(tagged(&a_response_for_camera1())).unwrap();

    assert!(conn.poll_event().is_none());
    assert!(conn.is_query_pending(query_id));
}
