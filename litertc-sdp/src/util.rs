//! Helpers for locally generated descriptions.

use rand::distr::Alphanumeric;
use rand::Rng;

/// ICE ufrag length used in locally generated descriptions.
pub const ICE_UFRAG_LEN: usize = 4;
/// ICE pwd length used in locally generated descriptions.
pub const ICE_PWD_LEN: usize = 24;

/// Generates a new origin session id.
///
/// The top bit is cleared so the decimal value survives embedders
/// that round-trip it through a signed 64-bit integer.
pub fn new_session_id() -> u64 {
    rand::random::<u64>() >> 1
}

/// Generates a random alphanumeric string of the given length.
pub fn rand_alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}
