//! admission-webhook - validating admission webhook for Kubernetes workloads.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Loads configuration from the environment
//! - Builds the validation registry once
//! - Starts the health server, the HTTP listener, and the HTTPS listener
//!   when certificates are mounted

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info};

use admission_webhook::health::{HealthState, run_health_server};
use admission_webhook::{
    Config, Dispatcher, Registry, WebhookState, listener_outcome, run_http_server,
    run_https_server,
};

/// Grace period for in-flight admission requests during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 2;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("admission_webhook=info".parse()?),
        )
        .json()
        .init();

    info!("Starting admission-webhook");

    let config = Config::from_env()?;

    // Err only if a provider is already installed
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let registry = Registry::builtin();
    info!(kinds = ?registry.keys(), "Validation registry built");

    let health_state = Arc::new(HealthState::new());
    let state = Arc::new(WebhookState::new(
        Dispatcher::new(registry),
        Some(health_state.clone()),
    ));

    // Start health server immediately so probes respond during startup
    let health_handle = {
        let health_state = health_state.clone();
        let port = config.health_port;
        tokio::spawn(async move { run_health_server(health_state, port).await })
    };

    let http_handle = {
        let state = state.clone();
        let port = config.port;
        tokio::spawn(async move { run_http_server(state, port).await })
    };

    let https_handle = if config.tls_available() {
        info!("TLS certificates found, starting HTTPS listener");
        let state = state.clone();
        let port = config.https_port();
        let cert_path = config.tls_cert_path.clone();
        let key_path = config.tls_key_path.clone();
        Some(tokio::spawn(async move {
            run_https_server(state, port, &cert_path, &key_path).await
        }))
    } else {
        info!(
            cert = %config.tls_cert_path.display(),
            key = %config.tls_key_path.display(),
            "TLS certificates not found, HTTPS listener disabled"
        );
        None
    };

    health_state.set_ready(true).await;

    // A listener finishing before shutdown is always a failure
    let exit = tokio::select! {
        result = http_handle => Some(listener_outcome("Webhook server", result)),
        result = health_handle => Some(listener_outcome("Health server", result)),
        result = async {
            match https_handle {
                Some(handle) => handle.await,
                None => std::future::pending().await,
            }
        } => Some(listener_outcome("Webhook TLS server", result)),
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Fail readiness so the Service stops routing new admission calls
            health_state.set_ready(false).await;
            info!("Marked webhook as not ready");

            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
            None
        }
    };

    if let Some(exit) = exit {
        error!(error = %exit, "Listener exited, stopping webhook");
        health_state.set_ready(false).await;
        return Err(exit.into());
    }

    info!("Webhook stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Signal handler setup failures are fatal; the process cannot shut down
/// gracefully without them.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
