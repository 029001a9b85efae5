//! Shared helpers for driftsync integration tests.

use std::net::SocketAddr;

/// Loopback address with an ephemeral port
#[must_use]
pub fn loopback() -> SocketAddr {
    "127.0.0.1:0".parse().expect("loopback address")
}

/// Deterministic non-repeating test payload
#[must_use]
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 31 + i / 251) % 251) as u8).collect()
}
