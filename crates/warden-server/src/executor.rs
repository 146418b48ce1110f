//! Action executor.
//!
//! Applies the [`SiteAction`]s a dispatched command produced to the host
//! collaborators. Actions run in order and the first failure stops the
//! batch; earlier writes stay applied.

use std::sync::Arc;

use warden_core::{
    CacheInvalidator, ConfigStore, GenerationCache, LogLevel, MemoryConfigStore, SiteAction,
};

use crate::error::ExecutorError;

/// Executes site actions against configuration and cache collaborators.
#[derive(Clone)]
pub struct ActionExecutor {
    config: Arc<dyn ConfigStore>,
    cache: Arc<dyn CacheInvalidator>,
}

impl ActionExecutor {
    /// Executor over the given collaborators.
    pub fn new(config: Arc<dyn ConfigStore>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self { config, cache }
    }

    /// Executor over fresh in-memory collaborators.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryConfigStore::new()), Arc::new(GenerationCache::new()))
    }

    /// Apply `actions` in order.
    ///
    /// # Errors
    ///
    /// The first collaborator failure. Nothing after it runs.
    pub fn execute(&self, actions: &[SiteAction]) -> Result<(), ExecutorError> {
        for action in actions {
            self.apply(action)?;
        }
        Ok(())
    }

    fn apply(&self, action: &SiteAction) -> Result<(), ExecutorError> {
        match action {
            // The reply carries the pulse.
            SiteAction::ReportPulse => Ok(()),
            SiteAction::SetConfig { key, value } => {
                self.config
                    .set_config(*key, *value)
                    .map_err(|source| ExecutorError::Config { key: *key, source })?;
                tracing::debug!(%key, %value, "config written");
                Ok(())
            },
            SiteAction::ClearCache(target) => {
                self.cache
                    .clear_cache(*target)
                    .map_err(|source| ExecutorError::Cache { target: *target, source })?;
                tracing::debug!(?target, "cache cleared");
                Ok(())
            },
            SiteAction::Log { level, message } => {
                match level {
                    LogLevel::Error => tracing::error!("{}", message),
                    LogLevel::Warn => tracing::warn!("{}", message),
                    LogLevel::Info => tracing::info!("{}", message),
                    LogLevel::Debug => tracing::debug!("{}", message),
                }
                Ok(())
            },
        }
    }
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor").finish_non_exhaustive()
    }
}
