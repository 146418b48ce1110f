//! Server error types.

use warden_core::{CacheTarget, ConfigKey, SiteError, StoreError};

/// Errors that stop the server from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport/network error
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Credential store could not be loaded
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// A collaborator refused one of a command's actions.
///
/// Actions before the failing one have already been applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    /// Configuration write failed
    #[error("failed to set {key}: {source}")]
    Config {
        /// Setting being written
        key: ConfigKey,
        /// Collaborator error
        source: SiteError,
    },

    /// Cache clear failed
    #[error("failed to clear {target:?} cache: {source}")]
    Cache {
        /// Cache being cleared
        target: CacheTarget,
        /// Collaborator error
        source: SiteError,
    },
}
