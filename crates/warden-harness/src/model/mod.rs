//! Reference model for model-based testing.
//!
//! The model captures what the gatekeeper must decide for a request, without
//! parsing, hashing or storage. It serves as the oracle against which the
//! real implementation is verified.
//!
//! # Design Principles
//!
//! - Simplicity: the model should be obviously correct
//! - Deterministic: same inputs produce same outputs

pub mod operation;
mod world;

pub use operation::{
    DeviceSlot, ModelRequest, NUM_DEVICES, NUM_SLOTS, Operation, OperationResult, Tamper,
    UNKNOWN_COMMAND,
};
pub use world::{ModelWorld, ObservableState, client_id, shared_key};
