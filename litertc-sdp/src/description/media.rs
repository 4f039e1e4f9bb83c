use std::fmt;

/// Maximum number of RTP payload types kept per media section.
/// Additional payload types in the `m=` line are silently ignored.
pub const MAX_RTP_PAYLOAD_TYPES: usize = 32;

/// Video codecs the codec recognizes in `a=rtpmap:` attributes.
///
/// Payload types bound to any other encoding name keep a `None` codec
/// and are dropped on re-serialization.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Codec {
    H264,
    Vp9,
}

impl Codec {
    pub(crate) fn from_encoding_name(name: &str) -> Option<Codec> {
        match name {
            "H264" => Some(Codec::H264),
            "VP9" => Some(Codec::Vp9),
            _ => None,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Codec::H264 => write!(f, "H264"),
            Codec::Vp9 => write!(f, "VP9"),
        }
    }
}

/// Binding of an RTP payload type number to a codec and clock rate.
///
/// Entries are created with a `None` codec when the `m=` line is
/// parsed, and resolved by a later `a=rtpmap:` attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RtpMap {
    /// Dynamic RTP payload type, in `[0, 127]`.
    pub payload_type: u8,
    /// Recognized codec, if an `a=rtpmap:` resolved one.
    pub codec: Option<Codec>,
    /// Clock rate in Hz, typically 90000 for video.
    pub clock_rate: u32,
}

impl RtpMap {
    pub fn new(payload_type: u8) -> Self {
        Self {
            payload_type,
            codec: None,
            clock_rate: 0,
        }
    }
}

/// One `m=` media section: the advertised port and its payload types.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MediaDescription {
    pub port: u16,
    pub rtpmaps: Vec<RtpMap>,
}

impl MediaDescription {
    /// Payload types bound to the given codec, in offer order.
    pub fn payload_types_for(&self, codec: Codec) -> impl Iterator<Item = &RtpMap> {
        self.rtpmaps.iter().filter(move |r| r.codec == Some(codec))
    }
}
