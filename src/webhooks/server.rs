//! Admission webhook server.
//!
//! HTTP adapter around the [`Dispatcher`]: decodes the AdmissionReview body,
//! asks the dispatcher for a decision, records metrics, and serializes the
//! response. The same router is served over plain HTTP and, when
//! certificates are mounted, over TLS on the next port.

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use crate::health::HealthState;
use crate::webhooks::dispatcher::{Dispatcher, Verdict};
use crate::webhooks::kind::KindIdentity;
use crate::webhooks::review::AdmissionReview;

/// Metrics label for requests with no registered chain
pub const UNREGISTERED_KIND_LABEL: &str = "unregistered";

/// Metrics label for DELETE requests
pub const DELETION_KIND_LABEL: &str = "deletion";

/// Shared state for webhook handlers
pub struct WebhookState {
    pub dispatcher: Dispatcher,
    pub health: Option<Arc<HealthState>>,
}

impl WebhookState {
    pub fn new(dispatcher: Dispatcher, health: Option<Arc<HealthState>>) -> Self {
        Self { dispatcher, health }
    }
}

/// Errors that can occur when running the webhook server
#[derive(Debug, Error)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    /// Server error
    #[error("Webhook server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Why a listener task stopped
#[derive(Debug, Error)]
pub enum ListenerExit {
    /// The listener returned without an error
    #[error("{0} stopped unexpectedly")]
    Stopped(&'static str),

    /// The listener returned an error
    #[error("{0} failed: {1}")]
    Failed(&'static str, String),

    /// The listener task panicked or was cancelled
    #[error("{0} task aborted: {1}")]
    Panicked(&'static str, String),
}

/// Classify the join result of a listener task.
///
/// Listeners run until shutdown, so every outcome is an error for the
/// process.
pub fn listener_outcome<E: Display>(
    name: &'static str,
    joined: Result<Result<(), E>, JoinError>,
) -> ListenerExit {
    match joined {
        Ok(Ok(())) => ListenerExit::Stopped(name),
        Ok(Err(e)) => ListenerExit::Failed(name, e.to_string()),
        Err(e) => ListenerExit::Panicked(name, e.to_string()),
    }
}

/// Kind label for metrics.
///
/// Only registered kinds get their own series. The request kind is caller
/// controlled, so everything else collapses into a fixed label.
pub fn metrics_kind_label(verdict: &Verdict, kind: &KindIdentity) -> String {
    match verdict {
        Verdict::Validated(_) => kind.registry_key(),
        Verdict::Unregistered => UNREGISTERED_KIND_LABEL.to_string(),
        Verdict::Deletion => DELETION_KIND_LABEL.to_string(),
    }
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/", post(validate))
        .route("/validate", post(validate))
        .with_state(state)
}

/// Admission handler
pub async fn validate(
    State(state): State<Arc<WebhookState>>,
    payload: Result<Json<AdmissionReview>, JsonRejection>,
) -> axum::response::Response {
    let review = match payload {
        Ok(Json(review)) => review,
        Err(rejection) => {
            warn!(error = %rejection, "Failed to decode AdmissionReview");
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid AdmissionReview: {}", rejection.body_text()),
            )
                .into_response();
        }
    };

    let started = Instant::now();
    let dispatch = state.dispatcher.dispatch(&review.request);
    let elapsed = started.elapsed().as_secs_f64();

    if let Some(health) = &state.health {
        let violations = match &dispatch.verdict {
            Verdict::Validated(result) => result.errors.len(),
            Verdict::Unregistered | Verdict::Deletion => 0,
        };
        health.metrics.record_decision(
            &metrics_kind_label(&dispatch.verdict, &review.request.kind),
            dispatch.decision.allowed,
            violations,
            elapsed,
        );
    }

    let response = dispatch.decision.into_review(&review);
    debug!(uid = %response.response.uid, allowed = response.response.allowed, "Sending response");

    (StatusCode::OK, Json(response)).into_response()
}

/// Serve the webhook over plain HTTP on `0.0.0.0:<port>`
pub async fn run_http_server(state: Arc<WebhookState>, port: u16) -> Result<(), WebhookError> {
    let app = create_webhook_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Webhook server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve the webhook over TLS on `0.0.0.0:<port>`
///
/// # Arguments
/// * `cert_path` - Path to TLS certificate file (PEM format)
/// * `key_path` - Path to TLS private key file (PEM format)
pub async fn run_https_server(
    state: Arc<WebhookState>,
    port: u16,
    cert_path: &Path,
    key_path: &Path,
) -> Result<(), WebhookError> {
    let app = create_webhook_router(state);

    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "Webhook server listening with TLS");

    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
