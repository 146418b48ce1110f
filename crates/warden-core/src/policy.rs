//! Deployment authentication policy.

use std::time::Duration;

use warden_proto::Checks;

/// Default replay window.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(600);

/// Widest replay window a deployment may configure.
///
/// A complete request is MAC'd over unseparated digits, so digits moved
/// between `counter`, `timestamp` and `nonce` leave the MAC intact. Any such
/// move changes a ten-digit timestamp by at least 10^9 seconds, far outside
/// this window.
pub const MAX_TOLERANCE: Duration = Duration::from_secs(86_400);

/// Which checks a deployment enforces and how wide the replay window is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    /// A timestamp is fresh iff `now - timestamp < tolerance`.
    pub tolerance: Duration,
    /// Optional checks in force. Default: all.
    pub checks: Checks,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self { tolerance: DEFAULT_TOLERANCE, checks: Checks::all() }
    }
}

impl AuthPolicy {
    /// Policy with a custom replay window and all checks.
    pub fn with_tolerance(tolerance: Duration) -> Self {
        Self { tolerance, ..Self::default() }
    }

    /// Drop `checks` from the enforced set.
    #[must_use]
    pub fn waive(mut self, checks: Checks) -> Self {
        self.checks.remove(checks);
        self
    }

    /// Why this policy cannot be enforced safely, if it cannot.
    pub fn misconfiguration(&self) -> Option<&'static str> {
        if self.checks.contains(Checks::TIMESTAMP) && self.tolerance.is_zero() {
            return Some("zero tolerance with timestamp checks rejects every request");
        }
        if self.tolerance > MAX_TOLERANCE {
            return Some("tolerance wider than one day");
        }
        None
    }

    /// Returns true if every optional check is enforced.
    pub fn is_strict(&self) -> bool {
        self.checks.is_all()
    }
}
