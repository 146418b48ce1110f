//! Replay guard.
//!
//! Freshness has two halves: the timestamp must fall inside the replay
//! window, and the counter must exceed anything this device has used before.
//! The window bounds how long a captured request stays useful; the counter
//! makes it single-use inside that window.

use std::time::Duration;

use tracing::debug;

use crate::{
    credentials::DeviceCredential,
    error::AuthError,
    outcome::GateStatus,
    policy::AuthPolicy,
    validator::Request,
};

/// Timestamp, authorization and counter checks for one deployment policy.
#[derive(Debug, Clone, Copy)]
pub struct ReplayGuard {
    policy: AuthPolicy,
}

impl ReplayGuard {
    /// Guard enforcing `policy`.
    pub const fn new(policy: AuthPolicy) -> Self {
        Self { policy }
    }

    /// Check the request timestamp against `now` (Unix seconds).
    ///
    /// Valid iff `timestamp <= now` and `now - timestamp < tolerance`.
    /// Future-dated and stale requests get the same error.
    pub fn check_timestamp(&self, request: &Request, now: u64) -> Result<GateStatus, AuthError> {
        match request.timestamp {
            Some(timestamp) => {
                check_window(timestamp, now, self.policy.tolerance)?;
                Ok(GateStatus::Passed)
            },
            None => Ok(GateStatus::Waived),
        }
    }

    /// Require a known, authorized device.
    pub fn check_authorized<'a>(
        &self,
        credential: Option<&'a DeviceCredential>,
    ) -> Result<&'a DeviceCredential, AuthError> {
        match credential {
            Some(credential) if credential.authorized => Ok(credential),
            Some(credential) => {
                debug!(client_id = credential.client_id, "device not authorized");
                Err(AuthError::UnauthorizedClient)
            },
            None => Err(AuthError::UnauthorizedClient),
        }
    }

    /// Require `counter > last_counter`.
    ///
    /// Equal values are replays, including honest retries. This only reads
    /// the credential; the store advances the counter once the MAC holds.
    pub fn check_counter(
        &self,
        request: &Request,
        credential: &DeviceCredential,
    ) -> Result<GateStatus, AuthError> {
        match request.counter {
            Some(counter) if counter > credential.last_counter => Ok(GateStatus::Passed),
            Some(counter) => {
                debug!(
                    client_id = credential.client_id,
                    counter,
                    last_counter = credential.last_counter,
                    "counter not above last accepted"
                );
                Err(AuthError::ReplayedCounter)
            },
            None => Ok(GateStatus::Waived),
        }
    }
}

fn check_window(timestamp: u64, now: u64, tolerance: Duration) -> Result<(), AuthError> {
    let Some(age) = now.checked_sub(timestamp) else {
        return Err(AuthError::BadTimestamp);
    };
    if age >= tolerance.as_secs() {
        return Err(AuthError::BadTimestamp);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn request(counter: Option<u64>, timestamp: Option<u64>) -> Request {
        Request {
            client_id: 42,
            command: "checkPulse".into(),
            counter,
            timestamp,
            nonce: Some("abc123".into()),
            mac: String::new(),
        }
    }

    fn guard() -> ReplayGuard {
        ReplayGuard::new(AuthPolicy::default())
    }

    #[test]
    fn timestamp_window_boundaries() {
        let guard = guard();
        let ok = |ts| guard.check_timestamp(&request(Some(1), Some(ts)), NOW);

        assert_eq!(ok(NOW), Ok(GateStatus::Passed));
        assert_eq!(ok(NOW - 599), Ok(GateStatus::Passed));
        assert_eq!(ok(NOW - 600), Err(AuthError::BadTimestamp));
        assert_eq!(ok(NOW - 601), Err(AuthError::BadTimestamp));
        assert_eq!(ok(NOW + 1), Err(AuthError::BadTimestamp));
    }

    #[test]
    fn zero_tolerance_rejects_everything() {
        let guard = ReplayGuard::new(AuthPolicy::with_tolerance(Duration::ZERO));
        assert_eq!(
            guard.check_timestamp(&request(Some(1), Some(NOW)), NOW),
            Err(AuthError::BadTimestamp)
        );
    }

    #[test]
    fn missing_timestamp_is_waived() {
        assert_eq!(guard().check_timestamp(&request(Some(1), None), NOW), Ok(GateStatus::Waived));
    }

    #[test]
    fn unknown_and_revoked_devices_are_unauthorized() {
        let guard = guard();
        assert_eq!(guard.check_authorized(None), Err(AuthError::UnauthorizedClient));

        let revoked = DeviceCredential::new(42, "k").with_authorized(false);
        assert_eq!(guard.check_authorized(Some(&revoked)), Err(AuthError::UnauthorizedClient));

        let device = DeviceCredential::new(42, "k");
        assert_eq!(guard.check_authorized(Some(&device)), Ok(&device));
    }

    #[test]
    fn counter_must_be_strictly_greater() {
        let guard = guard();
        let device = DeviceCredential::new(42, "k").with_last_counter(5);

        assert_eq!(guard.check_counter(&request(Some(6), None), &device), Ok(GateStatus::Passed));
        assert_eq!(
            guard.check_counter(&request(Some(5), None), &device),
            Err(AuthError::ReplayedCounter)
        );
        assert_eq!(
            guard.check_counter(&request(Some(0), None), &device),
            Err(AuthError::ReplayedCounter)
        );
        assert_eq!(guard.check_counter(&request(None, None), &device), Ok(GateStatus::Waived));
    }

    proptest! {
        #[test]
        fn counters_at_or_below_last_are_replays(last in any::<u64>(), delta in 0u64..1000) {
            let device = DeviceCredential::new(1, "k").with_last_counter(last);
            let counter = last.saturating_sub(delta);
            prop_assert_eq!(
                guard().check_counter(&request(Some(counter), None), &device),
                Err(AuthError::ReplayedCounter)
            );
        }

        #[test]
        fn timestamps_inside_window_pass(age in 0u64..600) {
            prop_assert_eq!(
                guard().check_timestamp(&request(None, Some(NOW - age)), NOW),
                Ok(GateStatus::Passed)
            );
        }

        #[test]
        fn timestamps_outside_window_fail(age in 600u64..1_000_000, ahead in 1u64..1_000_000) {
            prop_assert_eq!(
                guard().check_timestamp(&request(None, Some(NOW - age)), NOW),
                Err(AuthError::BadTimestamp)
            );
            prop_assert_eq!(
                guard().check_timestamp(&request(None, Some(NOW + ahead)), NOW),
                Err(AuthError::BadTimestamp)
            );
        }
    }
}
