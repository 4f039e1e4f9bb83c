use std::fmt;
use std::fmt::Write as _;

use shared::error::{Error, Result};

use crate::description::media::{Codec, MediaDescription, RtpMap, MAX_RTP_PAYLOAD_TYPES};
use crate::direction::Direction;
use crate::lexer;

/// Length caps on the short printable strings of a description, in bytes.
pub const MAX_USERNAME_LEN: usize = 32;
pub const MAX_SESSION_ID_LEN: usize = 32;
pub const MAX_SESSION_VERSION_LEN: usize = 32;
pub const MAX_SESSION_NAME_LEN: usize = 32;

/// A single BUNDLE group with at most this many media identification tags.
pub const MAX_BUNDLE_MIDS: usize = 5;
pub const MAX_BUNDLE_MID_LEN: usize = 32;

/// ICE ufrag and pwd are capped at 256 Unicode code points.
pub const MAX_ICE_CHARS: usize = 256;

/// The only media transport profile the dialect speaks.
const MEDIA_PROTOCOL: &str = "UDP/TLS/RTP/SAVPF";

const ORIGIN_USERNAME: &str = "litertc/0.1.0";
const SESSION_URI: &str = "https://litertc.rs";

/// `o=` line contents. Network type, address type and unicast address
/// are fixed to `IN IP4 127.0.0.1` on the wire and not stored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Origin {
    pub username: String,
    pub session_id: String,
    pub session_version: String,
}

/// `t=` line contents, in seconds. `(0, 0)` denotes an unbounded session.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Timing {
    pub start: u64,
    pub stop: u64,
}

/// ICE credentials and options carried by the description.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IceParameters {
    pub ufrag: String,
    pub pwd: String,
    pub trickle: bool,
}

/// The subset of a session description the WebRTC dialect needs.
///
/// Obtained from [`SessionDescription::unmarshal`] or built field by
/// field and serialized with [`SessionDescription::marshal`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SessionDescription {
    /// Protocol version; only 0 is valid.
    pub version: u8,
    pub origin: Origin,
    /// Session name (`s=`), stored verbatim up to the cap. An empty
    /// name re-emits as a single space.
    pub session_name: String,
    pub timing: Timing,
    /// Media identification tags of the single BUNDLE group, in order.
    pub bundle_mids: Vec<String>,
    pub ice: IceParameters,
    /// SHA-256 digest of the DTLS certificate.
    pub fingerprint: [u8; 32],
    pub direction: Direction,
    pub rtcp_mux: bool,
    pub rtcp_rsize: bool,
    pub video: Option<MediaDescription>,
    /// Reserved; parsed symmetrically with video but unused downstream.
    pub audio: Option<MediaDescription>,
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marshal())
    }
}

impl SessionDescription {
    /// Parses the line-oriented SDP text format.
    ///
    /// Unknown line types and unknown attributes are silently ignored.
    /// The empty string yields a default description. On error the
    /// specific tag is returned and nothing is committed.
    pub fn unmarshal(raw: &str) -> Result<SessionDescription> {
        let mut sdp = SessionDescription::default();

        for line in lexer::lines(raw) {
            let line = line?;
            let result = match line.typ {
                b'v' => parse_version(&mut sdp, line.value),
                b'o' => parse_origin(&mut sdp, line.value),
                b's' => {
                    sdp.session_name = truncated(line.value, MAX_SESSION_NAME_LEN);
                    Ok(())
                }
                b't' => parse_timing(&mut sdp, line.value),
                // connection info is unused on the receive path
                b'c' => Ok(()),
                b'm' => parse_media_description(&mut sdp, line.value),
                b'a' => parse_attribute(&mut sdp, line.value),
                _ => Ok(()),
            };
            if let Err(err) = result {
                log::debug!(
                    "rejecting sdp line {}={}: {}",
                    line.typ as char,
                    line.value,
                    err
                );
                return Err(err);
            }
        }

        Ok(sdp)
    }

    /// Serializes the description back into SDP text.
    ///
    /// The video section lists only payload types resolved to H264;
    /// the origin username is a fixed placeholder.
    pub fn marshal(&self) -> String {
        let mut out = String::with_capacity(1024);

        out.push_str("v=0\n");
        let _ = writeln!(
            out,
            "o={ORIGIN_USERNAME} {} {} IN IP4 127.0.0.1",
            self.origin.session_id, self.origin.session_version
        );
        let _ = writeln!(
            out,
            "s={}",
            if self.session_name.is_empty() {
                " "
            } else {
                &self.session_name
            }
        );
        let _ = writeln!(out, "u={SESSION_URI}");
        let _ = writeln!(out, "t={} {}", self.timing.start, self.timing.stop);

        out.push_str("a=group:BUNDLE");
        for mid in self.bundle_mids.iter().filter(|m| !m.is_empty()) {
            let _ = write!(out, " {mid}");
        }
        out.push('\n');

        if let Some(video) = &self.video {
            if !video.rtpmaps.is_empty() {
                let _ = write!(out, "m=video {} {MEDIA_PROTOCOL}", video.port);
                for rtpmap in video.payload_types_for(Codec::H264) {
                    let _ = write!(out, " {}", rtpmap.payload_type);
                }
                out.push('\n');
            }
        }

        out.push_str("c=IN IP4 0.0.0.0\n");
        let _ = writeln!(out, "a=ice-ufrag:{}", self.ice.ufrag);
        let _ = writeln!(out, "a=ice-pwd:{}", self.ice.pwd);
        if self.ice.trickle {
            out.push_str("a=ice-options:trickle\n");
        }

        out.push_str("a=fingerprint:sha-256 ");
        for (i, octet) in self.fingerprint.iter().enumerate() {
            if i > 0 {
                out.push(':');
            }
            let _ = write!(out, "{octet:02X}");
        }
        out.push('\n');

        let _ = writeln!(out, "a={}", self.direction);
        if self.rtcp_mux {
            out.push_str("a=rtcp-mux\n");
        }
        if self.rtcp_rsize {
            out.push_str("a=rtcp-rsize\n");
        }

        if let Some(video) = &self.video {
            for rtpmap in video.payload_types_for(Codec::H264) {
                let _ = writeln!(
                    out,
                    "a=rtpmap:{} H264/{}",
                    rtpmap.payload_type, rtpmap.clock_rate
                );
            }
        }

        out.push_str("a=mid:0\n");

        out
    }
}

fn parse_version(sdp: &mut SessionDescription, value: &str) -> Result<()> {
    if value != "0" {
        return Err(Error::ErrSdpMalformedVersion);
    }
    sdp.version = 0;
    Ok(())
}

/// `o=<username> <sess-id> <sess-version> IN IP4 <unicast-address>`
///
/// The trailing network triple must be present; its address is discarded.
fn parse_origin(sdp: &mut SessionDescription, value: &str) -> Result<()> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() < 6 || tokens[3] != "IN" || tokens[4] != "IP4" {
        return Err(Error::ErrSdpMalformedOrigin);
    }

    let (username, session_id, session_version) = (tokens[0], tokens[1], tokens[2]);
    if username.len() > MAX_USERNAME_LEN
        || session_id.len() > MAX_SESSION_ID_LEN
        || session_version.len() > MAX_SESSION_VERSION_LEN
    {
        return Err(Error::ErrSdpMalformedOrigin);
    }
    if !is_decimal(session_id) || !is_decimal(session_version) {
        return Err(Error::ErrSdpMalformedOrigin);
    }

    sdp.origin = Origin {
        username: username.to_owned(),
        session_id: session_id.to_owned(),
        session_version: session_version.to_owned(),
    };
    Ok(())
}

fn parse_timing(sdp: &mut SessionDescription, value: &str) -> Result<()> {
    let mut tokens = value.split_whitespace();
    let start = tokens
        .next()
        .and_then(|t| t.parse::<u64>().ok())
        .ok_or(Error::ErrSdpMalformedTiming)?;
    let stop = tokens
        .next()
        .and_then(|t| t.parse::<u64>().ok())
        .ok_or(Error::ErrSdpMalformedTiming)?;
    sdp.timing = Timing { start, stop };
    Ok(())
}

/// `m=<kind> <port> UDP/TLS/RTP/SAVPF <pt> ...`
fn parse_media_description(sdp: &mut SessionDescription, value: &str) -> Result<()> {
    let mut tokens = value.split_whitespace();
    let kind = tokens.next().ok_or(Error::ErrSdpMalformedMedia)?;

    match kind {
        "video" => {
            if sdp.video.is_some() {
                return Err(Error::ErrSdpMalformedMedia);
            }
            sdp.video = Some(parse_media_section(tokens)?);
            Ok(())
        }
        "audio" => {
            if sdp.audio.is_some() {
                return Err(Error::ErrSdpMalformedMedia);
            }
            sdp.audio = Some(parse_media_section(tokens)?);
            Ok(())
        }
        "text" | "message" | "application" => Ok(()),
        _ => Err(Error::ErrSdpUnsupportedMediaType),
    }
}

fn parse_media_section<'a, I>(mut tokens: I) -> Result<MediaDescription>
where
    I: Iterator<Item = &'a str>,
{
    let port = tokens
        .next()
        .and_then(|t| t.parse::<u16>().ok())
        .ok_or(Error::ErrSdpMalformedMedia)?;

    let protocol = tokens.next().ok_or(Error::ErrSdpMalformedMedia)?;
    if protocol != MEDIA_PROTOCOL {
        return Err(Error::ErrSdpUnsupportedMediaProtocol);
    }

    let mut rtpmaps = Vec::new();
    let mut seen_payload_type = false;
    for token in tokens {
        seen_payload_type = true;
        if rtpmaps.len() == MAX_RTP_PAYLOAD_TYPES {
            break;
        }
        let payload_type = token
            .parse::<u8>()
            .map_err(|_| Error::ErrSdpMalformedMedia)?;
        if payload_type > 127 {
            return Err(Error::ErrSdpMalformedMedia);
        }
        rtpmaps.push(RtpMap::new(payload_type));
    }
    if !seen_payload_type {
        return Err(Error::ErrSdpMalformedMedia);
    }

    Ok(MediaDescription { port, rtpmaps })
}

fn parse_attribute(sdp: &mut SessionDescription, value: &str) -> Result<()> {
    if let Some((attr, val)) = value.split_once(':') {
        match attr {
            "group" => parse_attr_group(sdp, val),
            "ice-ufrag" => {
                sdp.ice.ufrag = val.chars().take(MAX_ICE_CHARS).collect();
                Ok(())
            }
            "ice-pwd" => {
                sdp.ice.pwd = val.chars().take(MAX_ICE_CHARS).collect();
                Ok(())
            }
            "ice-options" => {
                if val.split(' ').any(|t| t == "trickle") {
                    sdp.ice.trickle = true;
                }
                Ok(())
            }
            "fingerprint" => parse_attr_fingerprint(sdp, val),
            "rtpmap" => parse_attr_rtpmap(sdp, val),
            // Recognized, but carrying nothing the dialect acts on.
            "msid-semantic" | "rtcp" | "setup" | "mid" | "extmap" | "rtcp-fb" | "fmtp" => Ok(()),
            _ => Ok(()),
        }
    } else {
        match value {
            "recvonly" | "sendonly" | "sendrecv" => sdp.direction = Direction::from(value),
            "rtcp-mux" => sdp.rtcp_mux = true,
            "rtcp-rsize" => sdp.rtcp_rsize = true,
            _ => {}
        }
        Ok(())
    }
}

/// `a=group:BUNDLE <mid> <mid> ...`
///
/// Only the BUNDLE semantics value is supported; other groupings are
/// ignored.
fn parse_attr_group(sdp: &mut SessionDescription, val: &str) -> Result<()> {
    let mut tokens = val.split(' ');
    if tokens.next() == Some("BUNDLE") {
        sdp.bundle_mids = tokens
            .filter(|t| !t.is_empty())
            .take(MAX_BUNDLE_MIDS)
            .map(|t| truncated(t, MAX_BUNDLE_MID_LEN))
            .collect();
    }
    Ok(())
}

/// `a=fingerprint:sha-256 <32 colon-separated hex octets>`
fn parse_attr_fingerprint(sdp: &mut SessionDescription, val: &str) -> Result<()> {
    let (algo, hex) = val.split_once(' ').ok_or(Error::ErrSdpMalformed)?;
    if algo != "sha-256" {
        return Err(Error::ErrSdpUnsupportedFingerprintAlgo);
    }

    let mut fingerprint = [0u8; 32];
    let mut count = 0;
    for (i, octet) in hex.trim().split(':').enumerate() {
        if i >= fingerprint.len() || octet.len() != 2 {
            return Err(Error::ErrSdpMalformed);
        }
        fingerprint[i] =
            u8::from_str_radix(octet, 16).map_err(|_| Error::ErrSdpMalformed)?;
        count = i + 1;
    }
    if count != fingerprint.len() {
        return Err(Error::ErrSdpMalformed);
    }

    sdp.fingerprint = fingerprint;
    Ok(())
}

/// `a=rtpmap:<pt> <encoding-name>/<clock-rate>[/<encoding-params>]`
///
/// Resolves the codec of matching payload-type entries created by the
/// `m=` line. Unrecognized encoding names leave entries untouched.
fn parse_attr_rtpmap(sdp: &mut SessionDescription, val: &str) -> Result<()> {
    let (pt, rest) = val.split_once(' ').ok_or(Error::ErrSdpMalformedAttribute)?;
    let payload_type = pt
        .trim()
        .parse::<u32>()
        .map_err(|_| Error::ErrSdpMalformedAttribute)?;

    let mut parts = rest.split('/');
    let name = parts.next().unwrap_or("");
    let clock_rate = parts
        .next()
        .and_then(|c| c.parse::<u32>().ok())
        .ok_or(Error::ErrSdpMalformedAttribute)?;
    // encoding parameters (channel count), if present, are ignored
    if name.is_empty() {
        return Err(Error::ErrSdpMalformedAttribute);
    }

    if let Some(codec) = Codec::from_encoding_name(name) {
        for media in [sdp.video.as_mut(), sdp.audio.as_mut()].into_iter().flatten() {
            for rtpmap in media
                .rtpmaps
                .iter_mut()
                .filter(|r| u32::from(r.payload_type) == payload_type)
            {
                rtpmap.codec = Some(codec);
                rtpmap.clock_rate = clock_rate;
            }
        }
    }

    Ok(())
}

fn is_decimal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn truncated(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_owned()
}
