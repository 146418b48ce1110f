//! Text reply lines.
//!
//! Replies are bare text, not a structured envelope. A rejection is a single
//! `Error: <message>` line; success is signalled by its absence.

use std::fmt;

/// Prefix of every rejection line.
pub const ERROR_PREFIX: &str = "Error: ";

/// Message used when a deployment flattens rejection reasons.
pub const GENERIC_REJECTION: &str = "request rejected";

/// Body returned for a successful `checkPulse`.
pub const PULSE_BODY: &str = "OK";

/// Render a rejection line.
pub fn error_line(message: impl fmt::Display) -> String {
    format!("{ERROR_PREFIX}{message}")
}
