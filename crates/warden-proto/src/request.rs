//! Raw request as received off the wire.

use serde::{Deserialize, Serialize};

use crate::Field;

/// The six form fields of a command request, untyped and unvalidated.
///
/// Every field is optional at this layer; presence and format are the
/// validator's job. Unknown form parameters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRequest {
    /// Device identifier.
    pub client_id: Option<String>,
    /// Command name.
    pub command: Option<String>,
    /// Monotonic counter.
    pub counter: Option<String>,
    /// Unix timestamp in seconds.
    pub timestamp: Option<String>,
    /// Random per-request token.
    pub nonce: Option<String>,
    /// Client-computed MAC, lowercase hex.
    pub mac: Option<String>,
}

impl RawRequest {
    /// Value of `field`, if present.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Value of `field` if present and not blank.
    pub fn non_empty(&self, field: Field) -> Option<&str> {
        self.get(field).filter(|value| !value.trim().is_empty())
    }

    /// Set `field`, replacing any previous value.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// Remove `field`.
    pub fn clear(&mut self, field: Field) {
        *self.slot_mut(field) = None;
    }

    /// Present fields as `(name, value)` pairs in wire order, for form
    /// encoding.
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        Field::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field.as_str(), value)))
            .collect()
    }

    const fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::ClientId => &self.client_id,
            Field::Command => &self.command,
            Field::Counter => &self.counter,
            Field::Timestamp => &self.timestamp,
            Field::Nonce => &self.nonce,
            Field::Mac => &self.mac,
        }
    }

    const fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::ClientId => &mut self.client_id,
            Field::Command => &mut self.command,
            Field::Counter => &mut self.counter,
            Field::Timestamp => &mut self.timestamp,
            Field::Nonce => &mut self.nonce,
            Field::Mac => &mut self.mac,
        }
    }
}
