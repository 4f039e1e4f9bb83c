use bytes::BytesMut;

use crate::messages::MediaMessage;

/// match_range accepts packets with the first byte in [lower..upper]
fn match_range(lower: u8, upper: u8, buf: &[u8]) -> bool {
    if buf.is_empty() {
        return false;
    }
    let b = buf[0];
    b >= lower && b <= upper
}

/// First-byte ranges as described in RFC7983
/// <https://tools.ietf.org/html/rfc7983>
///              +----------------+
///              |        [0..1] -+--> forward to STUN
///              |                |
///  packet -->  |      [20..63] -+--> forward to DTLS
///              |                |
///              |    [128..191] -+--> forward to SRTP / SRTCP
///              |                |
///              |     otherwise -+--> discard
///              +----------------+
/// match_stun accepts packets with the first byte in [0..1]
pub(crate) fn match_stun(buf: &[u8]) -> bool {
    match_range(0, 1, buf)
}

/// match_dtls accepts packets with the first byte in [20..63]
pub(crate) fn match_dtls(buf: &[u8]) -> bool {
    match_range(20, 63, buf)
}

/// match_srtp accepts packets with the first byte in [128..191]
pub(crate) fn match_srtp(buf: &[u8]) -> bool {
    match_range(128, 191, buf)
}

/// Classifies a media-socket datagram by its first byte.
///
/// Total and side-effect-free: every payload maps to exactly one of
/// STUN, DTLS, SRTP/SRTCP, or discard (`None`).
pub fn classify(buf: &[u8]) -> Option<MediaMessage> {
    if match_stun(buf) {
        Some(MediaMessage::Stun(BytesMut::from(buf)))
    } else if match_dtls(buf) {
        Some(MediaMessage::Dtls(BytesMut::from(buf)))
    } else if match_srtp(buf) {
        Some(MediaMessage::Rtp(BytesMut::from(buf)))
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_classifier_is_a_partition() {
        for b in 0u16..=255 {
            let buf = [b as u8, 0x00];
            let in_ranges = [match_stun(&buf), match_dtls(&buf), match_srtp(&buf)];
            let hits = in_ranges.iter().filter(|m| **m).count();
            assert!(hits <= 1, "byte {b} matched {hits} classes");

            match classify(&buf) {
                Some(MediaMessage::Stun(_)) => assert!(b <= 1),
                Some(MediaMessage::Dtls(_)) => assert!((20..=63).contains(&b)),
                Some(MediaMessage::Rtp(_)) => assert!((128..=191).contains(&b)),
                None => {
                    assert!(!in_ranges.iter().any(|m| *m), "byte {b} discarded but matched")
                }
            }
        }
    }

    #[test]
    fn test_classify_boundaries() {
        assert!(matches!(classify(&[0]), Some(MediaMessage::Stun(_))));
        assert!(matches!(classify(&[1]), Some(MediaMessage::Stun(_))));
        assert!(classify(&[2]).is_none());
        assert!(classify(&[19]).is_none());
        assert!(matches!(classify(&[20]), Some(MediaMessage::Dtls(_))));
        assert!(matches!(classify(&[63]), Some(MediaMessage::Dtls(_))));
        assert!(classify(&[64]).is_none());
        assert!(classify(&[127]).is_none());
        assert!(matches!(classify(&[128]), Some(MediaMessage::Rtp(_))));
        assert!(matches!(classify(&[191]), Some(MediaMessage::Rtp(_))));
        assert!(classify(&[192]).is_none());
        assert!(classify(&[255]).is_none());
    }

    #[test]
    fn test_classify_empty_payload() {
        assert!(classify(&[]).is_none());
    }

    #[test]
    fn test_classify_keeps_payload() {
        let payload = [0x00, 0x01, 0x02, 0x03];
        match classify(&payload) {
            Some(MediaMessage::Stun(bytes)) => assert_eq!(&bytes[..], &payload),
            other => panic!("expected STUN, got {other:?}"),
        }
    }
}
