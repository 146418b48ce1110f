//! Model world: devices, clock and the server's counter table.
//!
//! The world is the oracle. Each request is evaluated by a flat list of
//! checks in gate order, with none of the real parsing or cryptography.

use warden_core::{AuthError, Builtin, DEFAULT_TOLERANCE};

use super::operation::{
    DeviceSlot, ModelRequest, NUM_DEVICES, NUM_SLOTS, Operation, OperationResult, Tamper,
};
use crate::sim_env::SIM_EPOCH;

/// Server-side `client_id` for a slot.
pub fn client_id(slot: DeviceSlot) -> u64 {
    u64::from(slot) + 1
}

/// Shared key for a slot.
pub fn shared_key(slot: DeviceSlot) -> Vec<u8> {
    vec![slot.wrapping_add(1); 32]
}

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Per-slot `(last_counter, authorized)`; unknown slots read `(0, false)`.
    pub devices: Vec<(u64, bool)>,
}

#[derive(Debug, Clone)]
struct ModelDevice {
    provisioned: bool,
    authorized: bool,
    /// Server's last accepted counter.
    last_counter: u64,
    /// Last counter the device's client signed with.
    client_counter: u64,
    last_request: Option<ModelRequest>,
}

/// Model world: the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    devices: Vec<ModelDevice>,
    now: u64,
    tolerance: u64,
}

impl ModelWorld {
    /// World at [`SIM_EPOCH`] with the default replay window and every
    /// provisioned device at counter 0.
    pub fn new() -> Self {
        let devices = (0..NUM_SLOTS)
            .map(|slot| ModelDevice {
                provisioned: slot < NUM_DEVICES,
                authorized: slot < NUM_DEVICES,
                last_counter: 0,
                client_counter: 0,
                last_request: None,
            })
            .collect();

        Self { devices, now: SIM_EPOCH, tolerance: DEFAULT_TOLERANCE.as_secs() }
    }

    /// Current simulated time.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Apply an operation and return the result.
    ///
    /// The result should match the real implementation's result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match *op {
            Operation::Send { device, command, tamper } => {
                let request = self.sign(Operation::slot(device), command, tamper);
                self.evaluate(&request)
            },
            Operation::Replay { device } => {
                let slot = usize::from(Operation::slot(device));
                match self.devices[slot].last_request.clone() {
                    Some(request) => self.evaluate(&request),
                    None => OperationResult::Ok,
                }
            },
            Operation::AdvanceClock { secs } => {
                self.now += u64::from(secs);
                OperationResult::Ok
            },
            Operation::Revoke { device } => {
                let device = &mut self.devices[usize::from(Operation::slot(device))];
                if device.provisioned {
                    device.authorized = false;
                }
                OperationResult::Ok
            },
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        let devices = self
            .devices
            .iter()
            .map(|d| if d.provisioned { (d.last_counter, d.authorized) } else { (0, false) })
            .collect();
        ObservableState { devices }
    }

    /// The device's client signs a request, which may then be tampered with.
    fn sign(&mut self, slot: DeviceSlot, command: u8, tamper: Tamper) -> ModelRequest {
        let device = &mut self.devices[usize::from(slot)];
        device.client_counter += 1;

        let mut request = ModelRequest {
            device: slot,
            command: Operation::command_name(command),
            missing: tamper.dropped_field(),
            counter: device.client_counter,
            timestamp: self.now,
            mac_valid: true,
        };

        match tamper {
            Tamper::None | Tamper::DropField(_) => {},
            Tamper::StaleCounter => {
                request.counter = device.last_counter;
                request.mac_valid = false;
            },
            Tamper::FutureTimestamp(ahead) => {
                request.timestamp = self.now + 1 + u64::from(ahead);
                request.mac_valid = false;
            },
            Tamper::CorruptMac => request.mac_valid = false,
        }

        device.last_request = Some(request.clone());
        request
    }

    fn evaluate(&mut self, request: &ModelRequest) -> OperationResult {
        if let Some(field) = request.missing {
            return OperationResult::Rejected(AuthError::MissingParameter(field));
        }
        if !Builtin::ALL.iter().any(|b| b.name() == request.command) {
            return OperationResult::Rejected(AuthError::UnknownCommand);
        }
        if request.timestamp > self.now || self.now - request.timestamp >= self.tolerance {
            return OperationResult::Rejected(AuthError::BadTimestamp);
        }

        let device = &mut self.devices[usize::from(request.device)];
        if !device.provisioned || !device.authorized {
            return OperationResult::Rejected(AuthError::UnauthorizedClient);
        }
        if request.counter <= device.last_counter {
            return OperationResult::Rejected(AuthError::ReplayedCounter);
        }
        if !request.mac_valid {
            return OperationResult::Rejected(AuthError::MacMismatch);
        }

        device.last_counter = request.counter;
        OperationResult::Accepted(request.command)
    }
}

impl Default for ModelWorld {
    fn default() -> Self {
        Self::new()
    }
}
