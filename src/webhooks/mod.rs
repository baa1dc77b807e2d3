//! Validating admission webhook.
//!
//! The validation engine is layered leaves-first:
//! - [`policies`]: individual validators, one concern each
//! - [`chain`]: ordered validators for one kind, merged by AND / concatenation
//! - [`registry`]: immutable kind → chain table built at startup
//! - [`dispatcher`]: request → registry lookup → chain → decision
//!
//! [`server`] is the HTTP adapter that feeds decoded requests to the
//! dispatcher.

pub mod chain;
pub mod dispatcher;
pub mod kind;
pub mod policies;
pub mod registry;
pub mod review;
mod server;

pub use chain::Chain;
pub use dispatcher::{Dispatch, Dispatcher, Verdict};
pub use kind::KindIdentity;
pub use policies::{ContainerSpec, ManifestObject, ShapeError, ValidationResult, Validator};
pub use registry::Registry;
pub use review::{
    AdmissionDecision, AdmissionRequest, AdmissionReview, AdmissionReviewResponse, AdmissionStatus,
};
pub use server::{
    DELETION_KIND_LABEL, ListenerExit, UNREGISTERED_KIND_LABEL, WebhookError, WebhookState,
    create_webhook_router, listener_outcome, metrics_kind_label, run_http_server,
    run_https_server, validate,
};

// Re-export kube-rs operation type for request construction in tests
pub use kube::core::admission::Operation;
