use std::fmt;

/// Media flow direction of a session, set by the `a=sendrecv`,
/// `a=sendonly` and `a=recvonly` flag attributes.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Send and receive media (`a=sendrecv`). The default when no
    /// direction attribute is present.
    #[default]
    SendRecv,
    /// Receive only (`a=recvonly`).
    RecvOnly,
    /// Send only (`a=sendonly`).
    SendOnly,
}

const DIRECTION_SEND_RECV_STR: &str = "sendrecv";
const DIRECTION_RECV_ONLY_STR: &str = "recvonly";
const DIRECTION_SEND_ONLY_STR: &str = "sendonly";

impl Direction {
    /// The direction the remote peer sees, used when answering an offer.
    pub fn reverse(&self) -> Direction {
        match *self {
            Direction::SendRecv => Direction::SendRecv,
            Direction::RecvOnly => Direction::SendOnly,
            Direction::SendOnly => Direction::RecvOnly,
        }
    }
}

impl From<&str> for Direction {
    fn from(raw: &str) -> Self {
        match raw {
            DIRECTION_RECV_ONLY_STR => Direction::RecvOnly,
            DIRECTION_SEND_ONLY_STR => Direction::SendOnly,
            _ => Direction::SendRecv,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Direction::SendRecv => write!(f, "{DIRECTION_SEND_RECV_STR}"),
            Direction::RecvOnly => write!(f, "{DIRECTION_RECV_ONLY_STR}"),
            Direction::SendOnly => write!(f, "{DIRECTION_SEND_ONLY_STR}"),
        }
    }
}
