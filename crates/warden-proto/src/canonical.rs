//! Canonical message construction.
//!
//! A request carrying every field is MAC'd over the plain concatenation
//! `client_id‖command‖counter‖timestamp‖nonce`, with no separators.
//!
//! Without separators the field boundaries are only recoverable when every
//! field is present. Once an optional field is omitted, digits can slide
//! between neighbours (`counter=6`, `timestamp=1700000000` and
//! `counter=61700000000` with no timestamp give the same bytes). A request
//! with any optional field absent therefore uses the tagged form instead:
//!
//! ```text
//! client_id=2:42;command=7:debugOn;nonce=3:abc;
//! ```
//!
//! Each present field is written as `name=len:value;`. The tagged form starts
//! with a letter and the plain form with a digit, so the two never collide.

use std::fmt;

use crate::Field;

/// The authenticated fields of a request, in canonical order.
///
/// The `Display` output is the exact byte string that both sides feed to
/// HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalFields<'a> {
    /// Device identifier.
    pub client_id: u64,
    /// Command name, already trimmed.
    pub command: &'a str,
    /// Monotonic counter, if supplied.
    pub counter: Option<u64>,
    /// Unix timestamp in seconds, if supplied.
    pub timestamp: Option<u64>,
    /// Nonce, if supplied.
    pub nonce: Option<&'a str>,
}

impl CanonicalFields<'_> {
    /// Canonical message bytes.
    pub fn to_message(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Returns true if every optional field is present, selecting the plain
    /// concatenated form.
    pub fn is_complete(&self) -> bool {
        self.counter.is_some() && self.timestamp.is_some() && self.nonce.is_some()
    }
}

impl fmt::Display for CanonicalFields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(counter), Some(timestamp), Some(nonce)) =
            (self.counter, self.timestamp, self.nonce)
        {
            return write!(f, "{}{}{counter}{timestamp}{nonce}", self.client_id, self.command);
        }

        tagged(f, Field::ClientId, &self.client_id.to_string())?;
        tagged(f, Field::Command, self.command)?;
        if let Some(counter) = self.counter {
            tagged(f, Field::Counter, &counter.to_string())?;
        }
        if let Some(timestamp) = self.timestamp {
            tagged(f, Field::Timestamp, &timestamp.to_string())?;
        }
        if let Some(nonce) = self.nonce {
            tagged(f, Field::Nonce, nonce)?;
        }
        Ok(())
    }
}

fn tagged(f: &mut fmt::Formatter<'_>, field: Field, value: &str) -> fmt::Result {
    write!(f, "{field}={}:{value};", value.len())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn concatenates_without_separators() {
        let fields = CanonicalFields {
            client_id: 42,
            command: "checkPulse",
            counter: Some(6),
            timestamp: Some(1_700_000_000),
            nonce: Some("abc123"),
        };
        assert_eq!(fields.to_string(), "42checkPulse61700000000abc123");
    }

    #[test]
    fn omitted_fields_switch_to_tagged_form() {
        let fields = CanonicalFields {
            client_id: 7,
            command: "debugOn",
            counter: None,
            timestamp: Some(10),
            nonce: None,
        };
        assert!(!fields.is_complete());
        assert_eq!(fields.to_message(), b"client_id=1:7;command=7:debugOn;timestamp=2:10;".to_vec());
    }

    #[test]
    fn digits_cannot_slide_between_fields() {
        let signed = CanonicalFields {
            client_id: 42,
            command: "lockDown",
            counter: Some(6),
            timestamp: Some(1_700_000_000),
            nonce: Some("abc123"),
        };
        let shifted = CanonicalFields {
            counter: Some(61_700_000_000),
            timestamp: None,
            ..signed
        };
        assert_ne!(signed.to_message(), shifted.to_message());

        // Timestamp waived: a leading nonce digit moved into the counter.
        let signed = CanonicalFields { timestamp: None, nonce: Some("7f3a"), ..signed };
        let shifted = CanonicalFields { counter: Some(67), nonce: Some("f3a"), ..signed };
        assert_ne!(signed.to_message(), shifted.to_message());
    }

    #[test]
    fn dropping_a_field_changes_the_message() {
        let full = CanonicalFields {
            client_id: 42,
            command: "debugOff",
            counter: Some(9),
            timestamp: Some(100),
            nonce: Some("n0"),
        };
        for partial in [
            CanonicalFields { counter: None, ..full },
            CanonicalFields { timestamp: None, ..full },
            CanonicalFields { nonce: None, ..full },
        ] {
            assert_ne!(full.to_message(), partial.to_message());
            assert!(partial.to_string().starts_with("client_id="));
        }
    }

    #[test]
    fn zero_values_are_rendered() {
        let fields = CanonicalFields {
            client_id: 0,
            command: "openSite",
            counter: Some(0),
            timestamp: Some(0),
            nonce: Some("x"),
        };
        assert_eq!(fields.to_string(), "0openSite00x");
    }

    proptest! {
        #[test]
        fn message_is_deterministic(
            client_id in any::<u64>(),
            counter in any::<u64>(),
            timestamp in any::<u64>(),
            nonce in "[a-zA-Z0-9]{1,32}",
        ) {
            let fields = CanonicalFields {
                client_id,
                command: "clearCache",
                counter: Some(counter),
                timestamp: Some(timestamp),
                nonce: Some(&nonce),
            };
            prop_assert_eq!(fields.to_message(), fields.to_message());
            let expected = format!("{client_id}clearCache{counter}{timestamp}{nonce}");
            prop_assert_eq!(fields.to_string(), expected);
        }

        #[test]
        fn distinct_partial_tuples_never_collide(
            a in (any::<Option<u64>>(), any::<Option<u64>>(), proptest::option::of("[a-z0-9]{1,8}")),
            b in (any::<Option<u64>>(), any::<Option<u64>>(), proptest::option::of("[a-z0-9]{1,8}")),
        ) {
            // Two complete tuples share the plain form; the timestamp window
            // bounds how far digits can slide there.
            let complete = |t: &(Option<u64>, Option<u64>, Option<String>)| {
                t.0.is_some() && t.1.is_some() && t.2.is_some()
            };
            prop_assume!(!(complete(&a) && complete(&b)));

            let make = |(counter, timestamp, nonce): &(Option<u64>, Option<u64>, Option<String>)| {
                CanonicalFields {
                    client_id: 42,
                    command: "lockDown",
                    counter: *counter,
                    timestamp: *timestamp,
                    nonce: nonce.as_deref(),
                }
                .to_message()
            };
            prop_assume!(a != b);
            prop_assert_ne!(make(&a), make(&b));
        }
    }
}
