//! Warden wire vocabulary.
//!
//! Everything two parties must agree on bit-for-bit lives here: the names of
//! the six form fields, the raw request as it arrives off the wire, the
//! canonical message that gets MAC'd, the set of optional checks a deployment
//! may waive, and the shape of the text reply.
//!
//! # Canonical message
//!
//! ```text
//! client_id ‖ command ‖ counter ‖ timestamp ‖ nonce
//! ```
//!
//! Fields are concatenated in that order as their decimal/string forms with
//! no separator and no padding. Any change here breaks every deployed client.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod canonical;
pub mod checks;
pub mod field;
pub mod reply;
pub mod request;

pub use canonical::CanonicalFields;
pub use checks::Checks;
pub use field::Field;
pub use reply::{ERROR_PREFIX, GENERIC_REJECTION, PULSE_BODY, error_line};
pub use request::RawRequest;
