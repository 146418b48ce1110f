//! Client error types.

use thiserror::Error;
use warden_crypto::MacError;

/// Errors from client operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Command name the server could never accept.
    #[error("invalid command name: {name:?}")]
    InvalidCommand {
        /// The rejected name.
        name: String,
    },

    /// The counter reached `u64::MAX`; the device must be re-provisioned.
    #[error("counter exhausted")]
    CounterExhausted,

    /// Signing failed.
    #[error("signing failed: {0}")]
    Crypto(#[from] MacError),

    /// Server rejected the request.
    #[error("rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Reply text after the `Error: ` prefix.
        message: String,
    },

    /// Reply did not follow the protocol.
    #[error("unexpected reply ({status}): {body:?}")]
    UnexpectedReply {
        /// HTTP status code.
        status: u16,
        /// Raw reply body.
        body: String,
    },
}

impl ClientError {
    /// Returns true if this error is fatal (unrecoverable).
    ///
    /// Fatal errors need operator action: a bad command, an exhausted
    /// counter, or an authentication failure. Transient errors may succeed
    /// if the command is signed again.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::InvalidCommand { .. } | Self::CounterExhausted | Self::Crypto(_) => true,

            // 5xx is the server's fault; a fresh request may go through
            Self::Rejected { status, .. } => *status < 500,

            Self::UnexpectedReply { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_is_fatal() {
        let err = ClientError::Rejected { status: 403, message: "MAC mismatch".to_string() };
        assert!(err.is_fatal());
    }

    #[test]
    fn internal_error_is_transient() {
        let err = ClientError::Rejected { status: 500, message: "internal error".to_string() };
        assert!(!err.is_fatal());
    }

    #[test]
    fn counter_exhausted_is_fatal() {
        assert!(ClientError::CounterExhausted.is_fatal());
    }

    #[test]
    fn error_display() {
        let err = ClientError::Rejected { status: 403, message: "replayed counter".to_string() };
        assert_eq!(err.to_string(), "rejected (403): replayed counter");
    }
}
