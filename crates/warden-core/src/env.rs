//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples protocol logic from the wall clock and
//! the entropy source. The replay window depends on "now", and clients need
//! randomness for nonces; both come through here so that simulations can pin
//! time and seed the RNG.
//!
//! # Invariants
//!
//! - Wall clock: `unix_now()` is seconds since the Unix epoch, comparable with
//!   client-supplied timestamps. It is not required to be monotonic.
//! - Determinism: given the same seed, `random_bytes()` produces the same
//!   sequence in simulation implementations
//! - Isolation: implementations must not share global state

/// Abstract environment providing wall-clock time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// 1. Clock source: `unix_now()` reads the same clock clients are expected to
///    be synchronised to (UTC seconds)
/// 2. RNG quality: `random_bytes()` uses cryptographically secure entropy in
///    production
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current time as whole seconds since the Unix epoch.
    fn unix_now(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Security
    ///
    /// Production implementations MUST use OS entropy (`getrandom`).
    fn random_bytes(&self, buffer: &mut [u8]);
}
