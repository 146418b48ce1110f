//! Validation outcome.
//!
//! Each of the five gates records its own status as the request moves through
//! the pipeline. The dispatcher re-checks the whole conjunction before acting.

use std::fmt;

use warden_proto::Checks;

/// One independent check in the authentication pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// All required fields present and well-formed, command whitelisted.
    Format,
    /// Timestamp within the replay window.
    Timestamp,
    /// Device known and authorized.
    Authorization,
    /// Counter above the last accepted counter.
    Counter,
    /// MAC verifies under the device key.
    Mac,
}

impl Gate {
    /// All gates in evaluation order.
    pub const ALL: [Self; 5] =
        [Self::Format, Self::Timestamp, Self::Authorization, Self::Counter, Self::Mac];

    /// Whether `checks` permits this gate to be waived.
    pub fn waivable_under(self, checks: Checks) -> bool {
        match self {
            Self::Timestamp => !checks.contains(Checks::TIMESTAMP),
            Self::Counter => !checks.contains(Checks::COUNTER),
            Self::Format | Self::Authorization | Self::Mac => false,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Format => 0,
            Self::Timestamp => 1,
            Self::Authorization => 2,
            Self::Counter => 3,
            Self::Mac => 4,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Format => "format",
            Self::Timestamp => "timestamp",
            Self::Authorization => "authorization",
            Self::Counter => "counter",
            Self::Mac => "mac",
        };
        f.write_str(name)
    }
}

/// Status of a single gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateStatus {
    /// Not evaluated yet.
    #[default]
    Pending,
    /// Evaluated and held.
    Passed,
    /// Skipped because the policy waives it and the client omitted the field.
    Waived,
}

/// Per-gate status for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationOutcome {
    gates: [GateStatus; 5],
}

impl ValidationOutcome {
    /// All gates pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the status of `gate`.
    pub fn record(&mut self, gate: Gate, status: GateStatus) {
        self.gates[gate.index()] = status;
    }

    /// Status of `gate`.
    pub fn status(&self, gate: Gate) -> GateStatus {
        self.gates[gate.index()]
    }

    /// The conjunction of all five gates under `checks`.
    ///
    /// A gate holds if it passed, or if it was waived and `checks` permits
    /// waiving it. A pending gate never holds.
    pub fn is_authenticated(&self, checks: Checks) -> bool {
        Gate::ALL.into_iter().all(|gate| match self.status(gate) {
            GateStatus::Passed => true,
            GateStatus::Waived => gate.waivable_under(checks),
            GateStatus::Pending => false,
        })
    }

    /// First gate that does not hold under `checks`.
    pub fn first_failing(&self, checks: Checks) -> Option<Gate> {
        Gate::ALL.into_iter().find(|gate| match self.status(*gate) {
            GateStatus::Passed => false,
            GateStatus::Waived => !gate.waivable_under(checks),
            GateStatus::Pending => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_passed() -> ValidationOutcome {
        let mut outcome = ValidationOutcome::new();
        for gate in Gate::ALL {
            outcome.record(gate, GateStatus::Passed);
        }
        outcome
    }

    #[test]
    fn fresh_outcome_is_not_authenticated() {
        let outcome = ValidationOutcome::new();
        assert!(!outcome.is_authenticated(Checks::empty()));
        assert_eq!(outcome.first_failing(Checks::all()), Some(Gate::Format));
    }

    #[test]
    fn all_passed_is_authenticated() {
        assert!(all_passed().is_authenticated(Checks::all()));
        assert_eq!(all_passed().first_failing(Checks::all()), None);
    }

    #[test]
    fn waived_counter_needs_policy_permission() {
        let mut outcome = all_passed();
        outcome.record(Gate::Counter, GateStatus::Waived);

        assert!(!outcome.is_authenticated(Checks::all()));
        assert_eq!(outcome.first_failing(Checks::all()), Some(Gate::Counter));
        assert!(outcome.is_authenticated(Checks::all() - Checks::COUNTER));
    }

    #[test]
    fn mac_can_never_be_waived() {
        let mut outcome = all_passed();
        outcome.record(Gate::Mac, GateStatus::Waived);
        assert!(!outcome.is_authenticated(Checks::empty()));
    }

    #[test]
    fn single_pending_gate_fails_conjunction() {
        for gate in Gate::ALL {
            let mut outcome = all_passed();
            outcome.record(gate, GateStatus::Pending);
            assert!(!outcome.is_authenticated(Checks::empty()), "{gate} pending");
        }
    }
}
