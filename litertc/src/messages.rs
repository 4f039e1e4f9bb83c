use bytes::BytesMut;

/// A media-socket datagram, classified by its first byte.
///
/// Produced by [`classify`](crate::handler::demuxer::classify);
/// datagrams outside the recognized ranges are discarded before one
/// of these is ever built.
#[derive(Debug)]
pub enum MediaMessage {
    Stun(BytesMut),
    Dtls(BytesMut),
    Rtp(BytesMut),
}

impl MediaMessage {
    pub fn payload(&self) -> &BytesMut {
        match self {
            MediaMessage::Stun(payload)
            | MediaMessage::Dtls(payload)
            | MediaMessage::Rtp(payload) => payload,
        }
    }
}
