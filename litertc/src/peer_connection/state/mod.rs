pub mod signaling_state;

pub use signaling_state::RTCSignalingState;
