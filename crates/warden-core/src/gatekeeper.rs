//! Gatekeeper
//!
//! Orchestrates the authentication pipeline and command dispatch.
//!
//! ## Pipeline
//!
//! ```text
//! RawRequest
//!   ├─ validate          format gate        (no store access)
//!   ├─ check_timestamp   timestamp gate
//!   ├─ store.get         authorization gate
//!   ├─ check_counter     counter gate       (read only)
//!   ├─ verify_mac        MAC gate
//!   ├─ advance_counter   atomic CAS, after the MAC holds
//!   └─ dispatch          conjunction re-checked, handler resolved
//! ```
//!
//! ## Design
//!
//! - Fail-fast: the first failing gate ends the request
//! - Counter commit after MAC: a forged request cannot burn a device's
//!   counters. The counter is still compared before the MAC, so a stale
//!   counter is reported as `ReplayedCounter` whatever the MAC says.
//! - Action-based: dispatch returns actions, no direct I/O

use tracing::debug;
use warden_proto::RawRequest;

use crate::{
    command::CommandRegistry,
    credentials::CredentialStore,
    dispatcher::{Authenticated, Dispatch, dispatch},
    env::Environment,
    error::AuthError,
    guard::ReplayGuard,
    outcome::{Gate, GateStatus, ValidationOutcome},
    policy::AuthPolicy,
    validator::validate,
    verifier::verify_mac,
};

/// Authenticates raw requests and dispatches their commands.
#[derive(Debug, Clone)]
pub struct Gatekeeper<E>
where
    E: Environment,
{
    env: E,
    policy: AuthPolicy,
    guard: ReplayGuard,
    registry: CommandRegistry,
}

impl<E> Gatekeeper<E>
where
    E: Environment,
{
    /// Gatekeeper with the built-in commands.
    pub fn new(env: E, policy: AuthPolicy) -> Self {
        Self::with_registry(env, policy, CommandRegistry::builtin())
    }

    /// Gatekeeper with a custom command registry.
    pub fn with_registry(env: E, policy: AuthPolicy, registry: CommandRegistry) -> Self {
        Self { env, policy, guard: ReplayGuard::new(policy), registry }
    }

    /// Policy in force.
    pub const fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    /// Whitelisted commands.
    pub const fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Run every gate over `raw`.
    ///
    /// On success the device's `last_counter` has been advanced (if a counter
    /// was supplied). On failure the store is untouched.
    ///
    /// # Errors
    ///
    /// The first failing gate's error; see [`AuthError`].
    pub fn authenticate<S>(&self, raw: &RawRequest, store: &S) -> Result<Authenticated, AuthError>
    where
        S: CredentialStore + ?Sized,
    {
        let checks = self.policy.checks;
        let mut outcome = ValidationOutcome::new();

        let request = validate(raw, checks, &self.registry)?;
        outcome.record(Gate::Format, GateStatus::Passed);

        let now = self.env.unix_now();
        outcome.record(Gate::Timestamp, self.guard.check_timestamp(&request, now)?);

        let credential = store.get(request.client_id)?;
        let credential = self.guard.check_authorized(credential.as_ref())?;
        outcome.record(Gate::Authorization, GateStatus::Passed);

        let counter_status = self.guard.check_counter(&request, credential)?;

        verify_mac(&request, credential)?;
        outcome.record(Gate::Mac, GateStatus::Passed);

        if let Some(counter) = request.counter {
            // Lost a race with a concurrent request carrying the same counter.
            if !store.advance_counter(request.client_id, counter)? {
                debug!(client_id = request.client_id, counter, "counter advanced concurrently");
                return Err(AuthError::ReplayedCounter);
            }
        }
        outcome.record(Gate::Counter, counter_status);

        debug!(client_id = request.client_id, command = %request.command, "request authenticated");
        Ok(Authenticated::new(request, outcome, checks))
    }

    /// Authenticate `raw` and resolve its command to actions.
    ///
    /// # Errors
    ///
    /// Any [`AuthError`] from [`Self::authenticate`], or
    /// `AuthError::SanityCheckFailed` from dispatch.
    pub fn process<S>(&self, raw: &RawRequest, store: &S) -> Result<Dispatch, AuthError>
    where
        S: CredentialStore + ?Sized,
    {
        let authenticated = self.authenticate(raw, store)?;
        dispatch(&authenticated, &self.registry)
    }
}
