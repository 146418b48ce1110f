//! Request field names.

use std::fmt;

/// One of the six form fields carried by every command request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Device identifier, decimal integer.
    ClientId,
    /// Command name, alphabetic.
    Command,
    /// Monotonic per-device counter, decimal integer.
    Counter,
    /// Seconds since the Unix epoch, decimal integer.
    Timestamp,
    /// Per-request random token, alphanumeric.
    Nonce,
    /// Lowercase hex HMAC-SHA256 over the canonical message.
    Mac,
}

impl Field {
    /// All fields in wire order.
    pub const ALL: [Self; 6] =
        [Self::ClientId, Self::Command, Self::Counter, Self::Timestamp, Self::Nonce, Self::Mac];

    /// Form parameter name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientId => "client_id",
            Self::Command => "command",
            Self::Counter => "counter",
            Self::Timestamp => "timestamp",
            Self::Nonce => "nonce",
            Self::Mac => "mac",
        }
    }

    /// Look up a field by its form parameter name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.as_str()), Some(field));
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(Field::from_name("signature"), None);
        assert_eq!(Field::from_name("Client_Id"), None);
    }
}
