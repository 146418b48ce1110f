//! Production Environment implementation using the system clock and RNG.

use std::time::{SystemTime, UNIX_EPOCH};

use warden_core::Environment;

/// Production environment using the wall clock and cryptographic RNG.
///
/// # Security
///
/// The RNG uses `getrandom`, which provides OS-level cryptographic
/// randomness. A clock set before the Unix epoch reads as 0, which makes
/// every client timestamp look future-dated and so rejects everything.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn unix_now(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_secs())
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // Zeroed nonces are predictable but harmless server-side: nothing
            // here relies on server randomness for authentication.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}
