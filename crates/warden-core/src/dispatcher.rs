//! Command dispatcher.
//!
//! Maps an authenticated command to the [`SiteAction`]s its handler produces.
//! Dispatch re-checks the full gate conjunction itself instead of trusting
//! that the caller short-circuited every failure.

use tracing::error;
use warden_proto::Checks;

use crate::{
    command::CommandRegistry,
    error::AuthError,
    outcome::ValidationOutcome,
    site::SiteAction,
    validator::Request,
};

/// A request whose gates have all been evaluated.
///
/// Only the gatekeeper builds these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    request: Request,
    outcome: ValidationOutcome,
    checks: Checks,
}

impl Authenticated {
    pub(crate) const fn new(request: Request, outcome: ValidationOutcome, checks: Checks) -> Self {
        Self { request, outcome, checks }
    }

    /// The validated request.
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Per-gate status.
    pub const fn outcome(&self) -> &ValidationOutcome {
        &self.outcome
    }
}

/// Result of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Device that issued the command.
    pub client_id: u64,
    /// Command name.
    pub command: String,
    /// Side effects to apply, in order.
    pub actions: Vec<SiteAction>,
}

impl Dispatch {
    /// Returns true if the command asked for a liveness report.
    pub fn reports_pulse(&self) -> bool {
        self.actions.contains(&SiteAction::ReportPulse)
    }
}

/// Resolve the handler for an authenticated request.
///
/// # Errors
///
/// Returns `AuthError::SanityCheckFailed` if any gate does not hold, or if the
/// command has no handler. Both indicate a bug upstream: the pipeline
/// rejects such requests before they get here.
pub fn dispatch(
    authenticated: &Authenticated,
    registry: &CommandRegistry,
) -> Result<Dispatch, AuthError> {
    let request = authenticated.request();

    if let Some(gate) = authenticated.outcome.first_failing(authenticated.checks) {
        error!(client_id = request.client_id, %gate, "dispatch reached with failing gate");
        return Err(AuthError::SanityCheckFailed);
    }

    let Some(handler) = registry.get(&request.command) else {
        error!(
            client_id = request.client_id,
            command = %request.command,
            "dispatch reached with unregistered command"
        );
        return Err(AuthError::SanityCheckFailed);
    };

    Ok(Dispatch {
        client_id: request.client_id,
        command: request.command.clone(),
        actions: handler.actions(),
    })
}
