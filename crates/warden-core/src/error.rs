//! Authentication errors.

use warden_proto::Field;

use crate::{credentials::StoreError, outcome::Gate};

/// Terminal rejection of a request.
///
/// Every variant ends the transaction. Nothing is retried and no fallback
/// command runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// A required field was absent or empty.
    #[error("missing parameter: {0}")]
    MissingParameter(Field),

    /// A field was present but malformed.
    #[error("invalid format: {0}")]
    InvalidFormat(Field),

    /// The command is not in the whitelist.
    #[error("unknown command")]
    UnknownCommand,

    /// The timestamp is in the future or outside the tolerance window.
    #[error("bad timestamp")]
    BadTimestamp,

    /// No credential for this client, or the credential is not authorized.
    #[error("unauthorized client")]
    UnauthorizedClient,

    /// The counter did not exceed the last accepted counter.
    #[error("replayed counter")]
    ReplayedCounter,

    /// The credential has no shared key configured.
    #[error("no shared key configured")]
    NoSharedKey,

    /// The supplied MAC does not match.
    #[error("MAC mismatch")]
    MacMismatch,

    /// Dispatch was reached without every gate holding.
    #[error("sanity check failed")]
    SanityCheckFailed,

    /// The credential store failed.
    #[error("credential store error: {0}")]
    Storage(#[from] StoreError),
}

impl AuthError {
    /// Gate this rejection belongs to, if any.
    pub const fn gate(&self) -> Option<Gate> {
        match self {
            Self::MissingParameter(_) | Self::InvalidFormat(_) | Self::UnknownCommand => {
                Some(Gate::Format)
            },
            Self::BadTimestamp => Some(Gate::Timestamp),
            Self::UnauthorizedClient => Some(Gate::Authorization),
            Self::ReplayedCounter => Some(Gate::Counter),
            Self::NoSharedKey | Self::MacMismatch => Some(Gate::Mac),
            Self::SanityCheckFailed | Self::Storage(_) => None,
        }
    }

    /// Returns true if the server, not the client, is at fault.
    ///
    /// These map to an internal error reply rather than a rejection.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::SanityCheckFailed | Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_field() {
        assert_eq!(AuthError::MissingParameter(Field::Nonce).to_string(), "missing parameter: nonce");
        assert_eq!(
            AuthError::InvalidFormat(Field::ClientId).to_string(),
            "invalid format: client_id"
        );
    }

    #[test]
    fn format_errors_belong_to_format_gate() {
        assert_eq!(AuthError::UnknownCommand.gate(), Some(Gate::Format));
        assert_eq!(AuthError::InvalidFormat(Field::Counter).gate(), Some(Gate::Format));
    }

    #[test]
    fn storage_failure_is_internal() {
        let err = AuthError::from(StoreError::Poisoned);
        assert!(err.is_internal());
        assert!(!AuthError::MacMismatch.is_internal());
        assert_eq!(err.gate(), None);
    }
}
