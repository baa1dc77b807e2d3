//! Request → decision mapping.
//!
//! The dispatcher resolves the chain for the request's kind, runs it, and
//! shapes the outcome into an [`AdmissionDecision`]. Unknown kinds are
//! allowed (fail-open). The request UID is always echoed.

use kube::core::admission::Operation;
use tracing::{debug, info, warn};

use crate::webhooks::policies::ValidationResult;
use crate::webhooks::registry::Registry;
use crate::webhooks::review::{AdmissionDecision, AdmissionRequest};

/// How a decision was reached
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The kind's chain ran
    Validated(ValidationResult),
    /// No chain registered for the kind
    Unregistered,
    /// DELETE requests carry no object and are never validated
    Deletion,
}

/// Outcome of dispatching one request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dispatch {
    pub decision: AdmissionDecision,
    pub verdict: Verdict,
}

/// Stateless front door of the validation engine
#[derive(Debug)]
pub struct Dispatcher {
    registry: Registry,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Registry::builtin())
    }
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Decide on a request
    pub fn decide(&self, request: &AdmissionRequest) -> AdmissionDecision {
        self.dispatch(request).decision
    }

    /// Decide on a request and report how the decision was reached
    pub fn dispatch(&self, request: &AdmissionRequest) -> Dispatch {
        let uid = request.uid.as_str();
        let kind = request.kind.registry_key();

        debug!(
            uid = %uid,
            kind = %kind,
            operation = ?request.operation,
            namespace = ?request.namespace,
            name = ?request.name,
            "Processing admission request"
        );

        if request.operation == Some(Operation::Delete) {
            info!(uid = %uid, kind = %kind, "Admission request allowed (DELETE)");
            return Dispatch {
                decision: AdmissionDecision::allow(uid),
                verdict: Verdict::Deletion,
            };
        }

        let Some(chain) = self.registry.lookup(&request.kind) else {
            debug!(uid = %uid, kind = %kind, "No chain registered, allowing");
            return Dispatch {
                decision: AdmissionDecision::allow(uid),
                verdict: Verdict::Unregistered,
            };
        };

        let result = chain.validate(&request.object);

        let decision = if result.valid {
            info!(uid = %uid, kind = %kind, "Admission request allowed");
            AdmissionDecision::allow(uid)
        } else {
            let decision = AdmissionDecision::deny(uid, &result.errors);
            warn!(
                uid = %uid,
                kind = %kind,
                violations = result.errors.len(),
                errors = decision.status.as_ref().map(|s| s.message.as_str()).unwrap_or_default(),
                "Admission request denied"
            );
            decision
        };

        Dispatch {
            decision,
            verdict: Verdict::Validated(result),
        }
    }
}
