//! Operations for model-based testing.
//!
//! Operations are generated randomly (proptest or `arbitrary`) and applied to
//! both the model and the real gatekeeper.

use arbitrary::Arbitrary;
use warden_core::{AuthError, Builtin};
use warden_proto::Field;

/// Device slot. Slots `0..NUM_DEVICES` are provisioned; the rest are devices
/// the server has never heard of.
pub type DeviceSlot = u8;

/// Provisioned devices.
pub const NUM_DEVICES: u8 = 3;

/// All slots, provisioned or not.
pub const NUM_SLOTS: u8 = NUM_DEVICES + 1;

/// Command name no registry knows.
pub const UNKNOWN_COMMAND: &str = "selfDestruct";

/// Operations that can be applied to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Device signs a fresh request, optionally tampered in flight.
    Send {
        /// Sending device (taken modulo [`NUM_SLOTS`]).
        device: DeviceSlot,
        /// Index into the built-in commands; out of range means unknown.
        command: u8,
        /// In-flight modification.
        tamper: Tamper,
    },

    /// Attacker resubmits the device's last request byte for byte.
    Replay {
        /// Device whose last request is replayed.
        device: DeviceSlot,
    },

    /// Advance the shared clock.
    AdvanceClock {
        /// Seconds to advance.
        secs: u16,
    },

    /// Administrator revokes a device.
    Revoke {
        /// Device to revoke.
        device: DeviceSlot,
    },
}

/// In-flight modification of a signed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum Tamper {
    /// Delivered as signed.
    None,
    /// Drop one field (index into `Field::ALL`, modulo 6).
    DropField(u8),
    /// Replace the counter with the server's current `last_counter`.
    StaleCounter,
    /// Push the timestamp into the future.
    FutureTimestamp(u8),
    /// Flip the last MAC character.
    CorruptMac,
}

impl Operation {
    /// Slot normalized into range.
    pub fn slot(device: DeviceSlot) -> DeviceSlot {
        device % NUM_SLOTS
    }

    /// Command name for a `Send` command index.
    pub fn command_name(command: u8) -> &'static str {
        Builtin::ALL.get(usize::from(command)).map_or(UNKNOWN_COMMAND, |b| b.name())
    }
}

impl Tamper {
    /// Field dropped by this tamper, if any.
    pub fn dropped_field(self) -> Option<Field> {
        match self {
            Self::DropField(index) => Some(Field::ALL[usize::from(index) % Field::ALL.len()]),
            _ => None,
        }
    }
}

/// What the model knows about a request in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// Sending slot.
    pub device: DeviceSlot,
    /// Command name as sent.
    pub command: &'static str,
    /// Field absent from the request.
    pub missing: Option<Field>,
    /// Counter as sent.
    pub counter: u64,
    /// Timestamp as sent.
    pub timestamp: u64,
    /// Whether the MAC still matches the fields as sent.
    pub mac_valid: bool,
}

/// Result of applying an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Nothing to compare.
    Ok,
    /// Command dispatched.
    Accepted(&'static str),
    /// Request rejected.
    Rejected(AuthError),
}

impl OperationResult {
    /// Check if a command was dispatched.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_index_maps_to_builtins_then_unknown() {
        assert_eq!(Operation::command_name(0), "checkPulse");
        assert_eq!(Operation::command_name(6), "lockDown");
        assert_eq!(Operation::command_name(7), UNKNOWN_COMMAND);
        assert_eq!(Operation::command_name(255), UNKNOWN_COMMAND);
    }

    #[test]
    fn drop_field_wraps() {
        assert_eq!(Tamper::DropField(0).dropped_field(), Some(Field::ClientId));
        assert_eq!(Tamper::DropField(11).dropped_field(), Some(Field::Mac));
        assert_eq!(Tamper::CorruptMac.dropped_field(), None);
    }
}
