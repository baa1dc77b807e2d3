//! admission-webhook library crate
//!
//! Exports the validation engine, its HTTP adapter, configuration, and the
//! health/metrics server.

pub mod config;
pub mod health;
pub mod webhooks;

pub use config::{Config, ConfigError};
pub use health::HealthState;
pub use webhooks::{
    AdmissionDecision, Chain, Dispatcher, KindIdentity, ListenerExit, Registry, ValidationResult,
    Validator, WebhookError, WebhookState, listener_outcome, run_http_server, run_https_server,
};
