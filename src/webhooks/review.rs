//! AdmissionReview wire types.
//!
//! Only the fields the webhook reads are modelled; everything else the API
//! server sends is ignored on input. `apiVersion`/`kind` are echoed back
//! when present, as `admission.k8s.io/v1` requires.

use kube::core::admission::Operation;
use serde::{Deserialize, Serialize};

use crate::webhooks::kind::KindIdentity;
use crate::webhooks::policies::ManifestObject;

/// HTTP status code attached to every rejection
pub const REJECTION_CODE: u16 = 400;

/// Separator between violation messages in a rejection
pub const MESSAGE_SEPARATOR: &str = "; ";

/// Inbound review envelope
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    pub request: AdmissionRequest,
}

/// The admission request proper
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    pub kind: KindIdentity,
    #[serde(default)]
    pub object: ManifestObject,
    #[serde(default)]
    pub operation: Option<Operation>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Rejection status
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionStatus {
    pub code: u16,
    pub message: String,
}

/// The verdict for one request. `status` is present iff `allowed` is false.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionStatus>,
}

impl AdmissionDecision {
    /// Allow without status
    pub fn allow(uid: impl Into<String>) -> Self {
        Self {
            allowed: true,
            uid: uid.into(),
            status: None,
        }
    }

    /// Deny with code 400 and the joined violation messages
    pub fn deny(uid: impl Into<String>, errors: &[String]) -> Self {
        Self {
            allowed: false,
            uid: uid.into(),
            status: Some(AdmissionStatus {
                code: REJECTION_CODE,
                message: errors.join(MESSAGE_SEPARATOR),
            }),
        }
    }

    /// Wrap into the outbound envelope, echoing the inbound type metadata
    pub fn into_review(self, review: &AdmissionReview) -> AdmissionReviewResponse {
        AdmissionReviewResponse {
            api_version: review.api_version.clone(),
            kind: review.kind.clone(),
            response: self,
        }
    }
}

/// Outbound review envelope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub response: AdmissionDecision,
}
