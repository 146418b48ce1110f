//! Warden production server.
//!
//! This crate provides the production server implementation using:
//! - axum over Tokio for the HTTP form endpoint
//! - A JSON file for device credentials
//! - System time and cryptographic RNG
//!
//! ## Architecture
//!
//! ```text
//! warden-server
//!   ├─ SystemEnv                (production Environment impl)
//!   ├─ http::router             (POST /, POST /command, GET /health)
//!   ├─ Gatekeeper               (sans-IO authentication + dispatch)
//!   ├─ JsonFileCredentialStore  (device records, atomic rewrites)
//!   └─ ActionExecutor           (applies SiteActions to collaborators)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod executor;
pub mod http;
pub mod storage;
mod system_env;

use std::{path::PathBuf, sync::Arc};

pub use error::{ExecutorError, ServerError};
pub use executor::ActionExecutor;
pub use http::{AppState, router};
pub use storage::JsonFileCredentialStore;
pub use system_env::SystemEnv;
use tokio::net::TcpListener;
use warden_core::{AuthPolicy, Gatekeeper};

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:8080")
    pub bind_address: String,
    /// JSON file of provisioned devices
    pub devices_path: PathBuf,
    /// Replay window and enforced checks
    pub policy: AuthPolicy,
    /// Hide which check rejected a request
    pub generic_errors: bool,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            devices_path: PathBuf::from("devices.json"),
            policy: AuthPolicy::default(),
            generic_errors: false,
        }
    }
}

/// Production Warden server.
///
/// Binds the HTTP listener and serves the command router over a
/// [`SystemEnv`] gatekeeper.
pub struct Server {
    listener: TcpListener,
    router: axum::Router,
}

impl Server {
    /// Load credentials and bind the listener.
    ///
    /// Configuration writes and cache clears go to in-memory collaborators;
    /// use [`Server::bind_with`] to supply the host's own.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The devices file is missing or malformed
    /// - Binding to the address fails
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        tracing::warn!("site actions use in-memory config and cache stores");
        Self::bind_with(config, ActionExecutor::in_memory()).await
    }

    /// Like [`Server::bind`], executing commands through `executor`.
    ///
    /// # Errors
    ///
    /// See [`Server::bind`].
    pub async fn bind_with(
        config: ServerRuntimeConfig,
        executor: ActionExecutor,
    ) -> Result<Self, ServerError> {
        if let Some(problem) = config.policy.misconfiguration() {
            return Err(ServerError::Config(problem.into()));
        }

        let store = JsonFileCredentialStore::open(&config.devices_path)?;
        let gatekeeper = Gatekeeper::new(SystemEnv::new(), config.policy);
        let state = AppState::new(gatekeeper, Arc::new(store), executor)
            .with_generic_errors(config.generic_errors);

        let listener = TcpListener::bind(&config.bind_address).await?;

        if !config.policy.is_strict() {
            tracing::warn!(enforced = ?config.policy.checks, "optional checks waived");
        }

        Ok(Self { listener, router: router(state) })
    }

    /// Serve requests until the process is stopped.
    ///
    /// # Errors
    ///
    /// Returns error if the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server listening on {}", self.listener.local_addr()?);
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }
}
