//! Request validator.
//!
//! Turns a [`RawRequest`] into a typed [`Request`] or rejects it. Presence of
//! every required field is checked before any field's format, and nothing
//! here touches the credential store.

use warden_proto::{CanonicalFields, Checks, Field, RawRequest};

use crate::{command::CommandRegistry, error::AuthError};

/// A well-formed request with a whitelisted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Device identifier.
    pub client_id: u64,
    /// Whitelisted command name.
    pub command: String,
    /// Counter, absent only if waived.
    pub counter: Option<u64>,
    /// Unix timestamp in seconds, absent only if waived.
    pub timestamp: Option<u64>,
    /// Nonce, absent only if waived.
    pub nonce: Option<String>,
    /// Client-supplied MAC, trimmed.
    pub mac: String,
}

impl Request {
    /// Fields covered by the MAC, in canonical order.
    ///
    /// Integers are rendered from their parsed values, so a client that sends
    /// `counter=007` must have MAC'd `7`.
    pub fn canonical(&self) -> CanonicalFields<'_> {
        CanonicalFields {
            client_id: self.client_id,
            command: &self.command,
            counter: self.counter,
            timestamp: self.timestamp,
            nonce: self.nonce.as_deref(),
        }
    }
}

/// Validate `raw` under `checks` against the whitelist in `registry`.
///
/// # Errors
///
/// - `AuthError::MissingParameter` for the first required field (wire order)
///   that is absent or blank
/// - `AuthError::InvalidFormat` for the first malformed field, checked in the
///   order client_id, counter, timestamp, nonce
/// - `AuthError::UnknownCommand` if the trimmed command is not registered
pub fn validate(
    raw: &RawRequest,
    checks: Checks,
    registry: &CommandRegistry,
) -> Result<Request, AuthError> {
    if let Some(missing) = checks.required_fields().find(|field| raw.non_empty(*field).is_none()) {
        return Err(AuthError::MissingParameter(missing));
    }

    let client_id =
        decimal(raw, Field::ClientId)?.ok_or(AuthError::MissingParameter(Field::ClientId))?;
    let counter = decimal(raw, Field::Counter)?;
    let timestamp = decimal(raw, Field::Timestamp)?;

    let nonce = match raw.non_empty(Field::Nonce) {
        Some(nonce) if nonce.bytes().all(|b| b.is_ascii_alphanumeric()) => Some(nonce.to_string()),
        Some(_) => return Err(AuthError::InvalidFormat(Field::Nonce)),
        None => None,
    };

    let command = raw.non_empty(Field::Command).map(str::trim).unwrap_or_default();
    if !registry.contains(command) {
        return Err(AuthError::UnknownCommand);
    }

    let mac = raw.non_empty(Field::Mac).map(str::trim).unwrap_or_default();

    Ok(Request {
        client_id,
        command: command.to_string(),
        counter,
        timestamp,
        nonce,
        mac: mac.to_string(),
    })
}

/// Parse a non-negative decimal integer field. Blank or absent is `None`.
fn decimal(raw: &RawRequest, field: Field) -> Result<Option<u64>, AuthError> {
    let Some(value) = raw.non_empty(field) else {
        return Ok(None);
    };
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AuthError::InvalidFormat(field));
    }
    value.parse().map(Some).map_err(|_| AuthError::InvalidFormat(field))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn full_request() -> RawRequest {
        RawRequest {
            client_id: Some("42".into()),
            command: Some("checkPulse".into()),
            counter: Some("6".into()),
            timestamp: Some("1700000000".into()),
            nonce: Some("abc123".into()),
            mac: Some("deadbeef".into()),
        }
    }

    fn check(raw: &RawRequest) -> Result<Request, AuthError> {
        validate(raw, Checks::all(), &CommandRegistry::builtin())
    }

    #[test]
    fn accepts_well_formed_request() {
        let request = check(&full_request()).unwrap();
        assert_eq!(request.client_id, 42);
        assert_eq!(request.command, "checkPulse");
        assert_eq!(request.counter, Some(6));
        assert_eq!(request.timestamp, Some(1_700_000_000));
        assert_eq!(request.nonce.as_deref(), Some("abc123"));
        assert_eq!(request.mac, "deadbeef");
    }

    #[test]
    fn every_field_is_required_by_default() {
        for field in Field::ALL {
            let mut raw = full_request();
            raw.clear(field);
            assert_eq!(check(&raw), Err(AuthError::MissingParameter(field)));

            raw.set(field, "");
            assert_eq!(check(&raw), Err(AuthError::MissingParameter(field)));
        }
    }

    #[test]
    fn presence_is_checked_before_format() {
        let mut raw = full_request();
        raw.set(Field::ClientId, "not-a-number");
        raw.clear(Field::Mac);
        assert_eq!(check(&raw), Err(AuthError::MissingParameter(Field::Mac)));
    }

    #[test]
    fn rejects_non_decimal_integers() {
        for field in [Field::ClientId, Field::Counter, Field::Timestamp] {
            for bad in ["-1", "+1", "1.5", "0x10", " 7", "7 ", "1e3", "18446744073709551616"] {
                let mut raw = full_request();
                raw.set(field, bad);
                assert_eq!(check(&raw), Err(AuthError::InvalidFormat(field)), "{field}={bad:?}");
            }
        }
    }

    #[test]
    fn leading_zeros_parse_to_the_number() {
        let mut raw = full_request();
        raw.set(Field::Counter, "007");
        assert_eq!(check(&raw).unwrap().counter, Some(7));
    }

    #[test]
    fn rejects_non_alphanumeric_nonce() {
        for bad in ["abc-123", "abc 123", "abc_123", "ümlaut"] {
            let mut raw = full_request();
            raw.set(Field::Nonce, bad);
            assert_eq!(check(&raw), Err(AuthError::InvalidFormat(Field::Nonce)));
        }
    }

    #[test]
    fn command_is_trimmed_then_looked_up() {
        let mut raw = full_request();
        raw.set(Field::Command, "  lockDown\n");
        assert_eq!(check(&raw).unwrap().command, "lockDown");

        raw.set(Field::Command, "dropTables");
        assert_eq!(check(&raw), Err(AuthError::UnknownCommand));

        raw.set(Field::Command, "checkpulse");
        assert_eq!(check(&raw), Err(AuthError::UnknownCommand));
    }

    #[test]
    fn format_errors_precede_unknown_command() {
        let mut raw = full_request();
        raw.set(Field::Command, "dropTables");
        raw.set(Field::Nonce, "a-b");
        assert_eq!(check(&raw), Err(AuthError::InvalidFormat(Field::Nonce)));
    }

    #[test]
    fn mac_is_trimmed_without_shape_check() {
        let mut raw = full_request();
        raw.set(Field::Mac, "  NOT HEX AT ALL \t");
        assert_eq!(check(&raw).unwrap().mac, "NOT HEX AT ALL");
    }

    #[test]
    fn waived_fields_may_be_omitted() {
        let mut raw = full_request();
        raw.clear(Field::Counter);
        raw.clear(Field::Nonce);
        raw.clear(Field::Timestamp);

        let request = validate(&raw, Checks::empty(), &CommandRegistry::builtin()).unwrap();
        assert_eq!(request.counter, None);
        assert_eq!(request.timestamp, None);
        assert_eq!(request.nonce, None);
        assert_eq!(request.canonical().to_string(), "client_id=2:42;command=10:checkPulse;");
    }

    #[test]
    fn waived_fields_must_still_be_well_formed_when_present() {
        let mut raw = full_request();
        raw.set(Field::Counter, "abc");
        assert_eq!(
            validate(&raw, Checks::empty(), &CommandRegistry::builtin()),
            Err(AuthError::InvalidFormat(Field::Counter))
        );
    }

    proptest! {
        #[test]
        fn never_panics_on_arbitrary_input(
            client_id in proptest::option::of(".{0,24}"),
            command in proptest::option::of(".{0,24}"),
            counter in proptest::option::of(".{0,24}"),
            timestamp in proptest::option::of(".{0,24}"),
            nonce in proptest::option::of(".{0,24}"),
            mac in proptest::option::of(".{0,70}"),
        ) {
            let raw = RawRequest { client_id, command, counter, timestamp, nonce, mac };
            let _ = check(&raw);
        }

        #[test]
        fn missing_any_field_always_rejects(index in 0usize..6) {
            let mut raw = full_request();
            raw.clear(Field::ALL[index]);
            prop_assert!(matches!(check(&raw), Err(AuthError::MissingParameter(_))));
        }
    }
}
