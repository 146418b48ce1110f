//! Deterministic simulation harness for Warden protocol testing.
//!
//! [`SimEnv`] pins the wall clock and seeds the RNG so that a failing run can
//! be replayed exactly from its seed.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and the real
//! `Gatekeeper`, and their results and counters are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;

pub use model::{
    DeviceSlot, ModelRequest, ModelWorld, NUM_DEVICES, NUM_SLOTS, ObservableState, Operation,
    OperationResult, Tamper, UNKNOWN_COMMAND,
};
pub use sim_env::{SIM_EPOCH, SimEnv};
