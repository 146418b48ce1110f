//! Simulated environment: manual clock, seeded RNG.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use warden_core::Environment;

/// Default simulated start time (2023-11-14T22:13:20Z).
pub const SIM_EPOCH: u64 = 1_700_000_000;

/// Deterministic environment for tests and simulation.
///
/// Clones share the clock and the RNG stream, so a client and a gatekeeper
/// built from the same `SimEnv` see the same time.
///
/// # Determinism
///
/// Given the same seed and the same sequence of calls, `random_bytes`
/// produces the same output.
#[derive(Clone)]
pub struct SimEnv {
    now: Arc<AtomicU64>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Environment at [`SIM_EPOCH`] with an RNG seeded from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self::at(seed, SIM_EPOCH)
    }

    /// Environment at `now` with an RNG seeded from `seed`.
    pub fn at(seed: u64, now: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Set the clock. May move it backwards, as a real wall clock can.
    pub fn set_now(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    fn unix_now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").field("now", &self.unix_now()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);

        let (mut x, mut y) = ([0u8; 32], [0u8; 32]);
        a.random_bytes(&mut x);
        b.random_bytes(&mut y);
        assert_eq!(x, y);

        let c = SimEnv::with_seed(8);
        c.random_bytes(&mut y);
        assert_ne!(x, y);
    }

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::with_seed(0);
        let other = env.clone();

        env.advance(600);
        assert_eq!(other.unix_now(), SIM_EPOCH + 600);

        other.set_now(5);
        assert_eq!(env.unix_now(), 5);
    }
}
