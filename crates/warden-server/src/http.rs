//! HTTP surface.
//!
//! ```text
//! POST /          form body, six fields -> text reply
//! POST /command   same handler
//! GET  /health    liveness, no authentication
//! ```
//!
//! Replies are a single text line. Authentication failures are all 403 so the
//! status code carries no information about which gate failed.

use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use warden_core::{AuthError, CredentialStore, Environment, Gatekeeper};
use warden_proto::{Field, GENERIC_REJECTION, PULSE_BODY, RawRequest, error_line};

use crate::executor::ActionExecutor;

/// Message for failures that are the server's fault.
pub const INTERNAL_ERROR: &str = "internal error";

/// Shared state behind every handler.
pub struct AppState<E>
where
    E: Environment,
{
    gatekeeper: Arc<Gatekeeper<E>>,
    store: Arc<dyn CredentialStore>,
    executor: ActionExecutor,
    generic_errors: bool,
}

impl<E> Clone for AppState<E>
where
    E: Environment,
{
    fn clone(&self) -> Self {
        Self {
            gatekeeper: Arc::clone(&self.gatekeeper),
            store: Arc::clone(&self.store),
            executor: self.executor.clone(),
            generic_errors: self.generic_errors,
        }
    }
}

impl<E> AppState<E>
where
    E: Environment,
{
    /// State with descriptive rejection messages.
    pub fn new(
        gatekeeper: Gatekeeper<E>,
        store: Arc<dyn CredentialStore>,
        executor: ActionExecutor,
    ) -> Self {
        Self { gatekeeper: Arc::new(gatekeeper), store, executor, generic_errors: false }
    }

    /// Reply `Error: request rejected` to every rejection instead of naming
    /// the failing check.
    #[must_use]
    pub fn with_generic_errors(mut self, generic_errors: bool) -> Self {
        self.generic_errors = generic_errors;
        self
    }

    /// Authenticate, dispatch and execute one request.
    pub fn handle(&self, raw: &RawRequest) -> (StatusCode, String) {
        let dispatch = match self.gatekeeper.process(raw, self.store.as_ref()) {
            Ok(dispatch) => dispatch,
            Err(err) if err.is_internal() => {
                tracing::error!(reason = %err, "request failed internally");
                return internal_error();
            },
            Err(err) => {
                tracing::warn!(
                    client_id = raw.get(Field::ClientId).unwrap_or_default(),
                    reason = %err,
                    "request rejected"
                );
                return (StatusCode::FORBIDDEN, self.rejection(&err));
            },
        };

        if let Err(err) = self.executor.execute(&dispatch.actions) {
            tracing::error!(
                client_id = dispatch.client_id,
                command = %dispatch.command,
                reason = %err,
                "command execution failed"
            );
            return internal_error();
        }

        tracing::info!(client_id = dispatch.client_id, command = %dispatch.command, "command executed");

        let body = if dispatch.reports_pulse() { PULSE_BODY } else { "" };
        (StatusCode::OK, body.to_string())
    }

    fn rejection(&self, err: &AuthError) -> String {
        if self.generic_errors { error_line(GENERIC_REJECTION) } else { error_line(err) }
    }
}

/// Build the router.
pub fn router<E>(state: AppState<E>) -> Router
where
    E: Environment,
{
    Router::new()
        .route("/", post(handle_command::<E>))
        .route("/command", post(handle_command::<E>))
        .route("/health", get(health))
        .with_state(state)
}

async fn handle_command<E>(
    State(state): State<AppState<E>>,
    form: Result<Form<RawRequest>, FormRejection>,
) -> Response
where
    E: Environment,
{
    let Form(raw) = match form {
        Ok(form) => form,
        Err(rejection) => {
            tracing::warn!(%rejection, "undecodable request body");
            let message = if state.generic_errors {
                GENERIC_REJECTION.to_string()
            } else {
                format!("malformed request: {}", rejection.body_text())
            };
            return (StatusCode::BAD_REQUEST, error_line(message)).into_response();
        },
    };

    // The credential store may block on file I/O.
    match tokio::task::spawn_blocking(move || state.handle(&raw)).await {
        Ok(reply) => reply.into_response(),
        Err(err) => {
            tracing::error!(%err, "request handler aborted");
            internal_error().into_response()
        },
    }
}

async fn health() -> &'static str {
    "ok"
}

fn internal_error() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, error_line(INTERNAL_ERROR))
}
