//! Warden Cryptographic Primitives
//!
//! HMAC-SHA256 over the canonical request message, rendered as lowercase hex.
//!
//! # Design
//!
//! All functions in this crate are pure. Keys are borrowed, never stored, and
//! nothing here logs.
//!
//! # Security Properties
//!
//! - Integrity and authenticity: a valid MAC proves possession of the device's
//!   shared key and that no canonical field was altered in transit
//! - Timing: verification compares digests in constant time, so response
//!   latency does not reveal how many leading characters of a forged MAC were
//!   correct

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod mac;

pub use mac::{MAC_HEX_LEN, MacError, sign, sign_fields, verify, verify_fields};
