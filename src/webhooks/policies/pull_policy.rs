//! Image pull policy restriction.
//!
//! `imagePullPolicy: Always` forces a registry round-trip on every pod start
//! even for pinned tags, so it is rejected. An absent policy passes.

use super::{ManifestObject, PodSpecLocation, ValidationResult, Validator, check_containers};

/// The pull policy that is not allowed
pub const FORBIDDEN_PULL_POLICY: &str = "Always";

/// Rejects containers with `imagePullPolicy: Always`.
#[derive(Clone, Debug)]
pub struct PullPolicyValidator {
    location: PodSpecLocation,
}

impl PullPolicyValidator {
    pub fn new(location: PodSpecLocation) -> Self {
        Self { location }
    }
}

impl Validator for PullPolicyValidator {
    fn name(&self) -> &str {
        "image-pull-policy"
    }

    fn validate(&self, object: &ManifestObject) -> ValidationResult {
        check_containers(object, self.location, "image pull policies", |container, result| {
            if container.image_pull_policy.as_deref() == Some(FORBIDDEN_PULL_POLICY) {
                result.reject(format!(
                    "Container {} uses imagePullPolicy '{}'",
                    container.name, FORBIDDEN_PULL_POLICY
                ));
            }
        })
    }
}
