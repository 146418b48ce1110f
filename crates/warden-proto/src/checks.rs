//! Optional credential checks.
//!
//! Constrained clients (no RTC, no persistent storage, no entropy source) may
//! be unable to supply every credential. A deployment can waive the
//! corresponding check explicitly; the default requires all of them.
//!
//! The MAC and the authorization lookup are never optional and have no flag.

use bitflags::bitflags;

use crate::Field;

bitflags! {
    /// Set of optional checks a deployment enforces.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Checks: u8 {
        /// Require a fresh `timestamp` within the tolerance window.
        const TIMESTAMP = 1 << 0;
        /// Require a strictly increasing `counter`.
        const COUNTER = 1 << 1;
        /// Require a `nonce`.
        const NONCE = 1 << 2;
    }
}

impl Default for Checks {
    fn default() -> Self {
        Self::all()
    }
}

impl Checks {
    /// Whether `field` must be present in every request under this policy.
    pub fn requires(self, field: Field) -> bool {
        match field {
            Field::Timestamp => self.contains(Self::TIMESTAMP),
            Field::Counter => self.contains(Self::COUNTER),
            Field::Nonce => self.contains(Self::NONCE),
            Field::ClientId | Field::Command | Field::Mac => true,
        }
    }

    /// Fields that must be present under this policy, in wire order.
    pub fn required_fields(self) -> impl Iterator<Item = Field> {
        Field::ALL.into_iter().filter(move |field| self.requires(*field))
    }
}
