//! Warden client.
//!
//! Signs admin commands for constrained devices. Pure and synchronous:
//! bring your own HTTP stack.
//!
//! ```text
//! Client::sign("checkPulse") -> RawRequest -> encode_form -> POST /
//!                                                  reply -> parse_reply
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod error;

pub use client::{Client, DeviceIdentity, NONCE_BYTES, Reply, encode_form, parse_reply};
pub use error::ClientError;
