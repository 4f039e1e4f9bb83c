use sdp::SessionDescription;
use serde::{Deserialize, Serialize};
use shared::error::Result;

use super::sdp_type::RTCSdpType;

/// A typed session description, as exchanged over the embedder's
/// signaling transport.
///
/// The constructors parse `sdp` eagerly, so a successfully built
/// value is known to satisfy the dialect.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct RTCSessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: RTCSdpType,

    pub sdp: String,

    /// Parsed form, populated by the constructors. Descriptions built
    /// through serde deserialize lazily via [`Self::parsed`].
    #[serde(skip)]
    pub(crate) parsed_cache: Option<SessionDescription>,
}

impl RTCSessionDescription {
    /// Builds an offer description, validating the SDP body.
    pub fn offer(sdp: String) -> Result<RTCSessionDescription> {
        Self::new(sdp, RTCSdpType::Offer)
    }

    /// Builds a provisional-answer description, validating the SDP body.
    pub fn pranswer(sdp: String) -> Result<RTCSessionDescription> {
        Self::new(sdp, RTCSdpType::Pranswer)
    }

    /// Builds an answer description, validating the SDP body.
    pub fn answer(sdp: String) -> Result<RTCSessionDescription> {
        Self::new(sdp, RTCSdpType::Answer)
    }

    fn new(sdp: String, sdp_type: RTCSdpType) -> Result<RTCSessionDescription> {
        let parsed = SessionDescription::unmarshal(&sdp)?;
        Ok(RTCSessionDescription {
            sdp_type,
            sdp,
            parsed_cache: Some(parsed),
        })
    }

    /// The parsed form of `sdp`, reparsing if this value did not come
    /// from a constructor.
    pub fn parsed(&self) -> Result<SessionDescription> {
        match &self.parsed_cache {
            Some(parsed) => Ok(parsed.clone()),
            None => SessionDescription::unmarshal(&self.sdp),
        }
    }
}

impl PartialEq for RTCSessionDescription {
    fn eq(&self, other: &Self) -> bool {
        self.sdp_type == other.sdp_type && self.sdp == other.sdp
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use shared::error::Error;

    const MINIMAL_OFFER: &str = "v=0\n\
        o=- 4242 2 IN IP4 127.0.0.1\n\
        s=-\n\
        t=0 0\n\
        m=video 9 UDP/TLS/RTP/SAVPF 102\n\
        a=ice-ufrag:abcd\n\
        a=ice-pwd:abcdefghijklmnopqrstuvwx\n\
        a=rtpmap:102 H264/90000\n";

    #[test]
    fn test_constructors_parse_eagerly() {
        let desc = RTCSessionDescription::offer(MINIMAL_OFFER.to_string()).unwrap();
        assert_eq!(desc.sdp_type, RTCSdpType::Offer);
        let parsed = desc.parsed().unwrap();
        assert_eq!(parsed.origin.session_id, "4242");
        assert!(parsed.video.is_some());

        let result = RTCSessionDescription::answer("v=1\n".to_string());
        assert_eq!(result.unwrap_err(), Error::ErrSdpMalformedVersion);
    }

    #[test]
    fn test_serde_round_trip() {
        let desc = RTCSessionDescription::answer(MINIMAL_OFFER.to_string()).unwrap();
        let json = serde_json::to_string(&desc).unwrap();
        assert!(json.contains("\"type\":\"answer\""));

        let back: RTCSessionDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
        // deserialized values reparse on demand
        assert!(back.parsed_cache.is_none());
        assert!(back.parsed().is_ok());
    }
}
