//! Validation policies for workload manifests.
//!
//! Each policy is a [`Validator`]: a named, pure check over one concern of a
//! manifest. Policies never share state and never mutate the manifest, so
//! the same instance serves every request concurrently.
//!
//! Policies:
//! - `image_tag`: images must carry an explicit, non-`latest` tag
//! - `pull_policy`: `imagePullPolicy: Always` is rejected
//! - `resources`: CPU and memory limits/requests must be declared

pub mod image_tag;
pub mod pull_policy;
pub mod resources;

pub use image_tag::ImageTagValidator;
pub use pull_policy::PullPolicyValidator;
pub use resources::ResourceRequirementsValidator;

use k8s_openapi::api::core::v1::ResourceRequirements;
use serde::Deserialize;
use thiserror::Error;

/// The resource body under validation, as delivered in the admission request.
pub type ManifestObject = serde_json::Value;

/// Outcome of a validator or of a whole chain.
///
/// `valid` is tracked explicitly rather than derived from `errors`, so a
/// validator may reject without itemizing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,
    /// Violation messages, in discovery order
    pub errors: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

impl ValidationResult {
    /// Create a passing result
    pub fn valid() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Create a failing result with a single message
    pub fn invalid(message: impl Into<String>) -> Self {
        let mut result = Self::valid();
        result.reject(message);
        result
    }

    /// Record a violation
    pub fn reject(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    /// Fold another result into this one: AND of validity, concatenation of errors.
    pub fn merge(&mut self, other: ValidationResult) {
        self.valid = self.valid && other.valid;
        self.errors.extend(other.errors);
    }
}

/// A single named check against one manifest.
pub trait Validator: Send + Sync {
    /// Stable identifier used in logs
    fn name(&self) -> &str;

    /// Evaluate the manifest. Must not mutate anything and must be
    /// deterministic for a given object.
    fn validate(&self, object: &ManifestObject) -> ValidationResult;
}

/// Where a kind keeps its pod spec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PodSpecLocation {
    /// Bare Pod: `spec`
    Pod,
    /// Workloads with a pod template: `spec.template.spec`
    PodTemplate,
    /// CronJob: `spec.jobTemplate.spec.template.spec`
    JobTemplate,
}

impl PodSpecLocation {
    fn segments(self) -> &'static [&'static str] {
        match self {
            PodSpecLocation::Pod => &["spec"],
            PodSpecLocation::PodTemplate => &["spec", "template", "spec"],
            PodSpecLocation::JobTemplate => &["spec", "jobTemplate", "spec", "template", "spec"],
        }
    }

    /// Dotted path of the container list
    pub fn containers_path(self) -> &'static str {
        match self {
            PodSpecLocation::Pod => "spec.containers",
            PodSpecLocation::PodTemplate => "spec.template.spec.containers",
            PodSpecLocation::JobTemplate => "spec.jobTemplate.spec.template.spec.containers",
        }
    }
}

/// A manifest that does not have the shape its kind implies.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("{path} is missing")]
    Missing { path: &'static str },

    #[error("{path} is not a list")]
    NotAList { path: &'static str },

    #[error("container at {path}[{index}] is malformed: {source}")]
    MalformedContainer {
        path: &'static str,
        index: usize,
        source: serde_json::Error,
    },

    #[error("container at {path}[{index}] is malformed: name is missing")]
    UnnamedContainer { path: &'static str, index: usize },
}

/// The container fields the policies inspect.
///
/// Decoding only these fields keeps unrelated parts of the container
/// (probes, env, security context) from making it unreadable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: Option<String>,
    pub image_pull_policy: Option<String>,
    pub resources: Option<ResourceRequirements>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContainer {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    image_pull_policy: Option<String>,
    #[serde(default)]
    resources: Option<ResourceRequirements>,
}

fn decode_container(
    item: &serde_json::Value,
    path: &'static str,
    index: usize,
) -> Result<ContainerSpec, ShapeError> {
    let raw = RawContainer::deserialize(item)
        .map_err(|source| ShapeError::MalformedContainer { path, index, source })?;

    let name = raw
        .name
        .filter(|name| !name.is_empty())
        .ok_or(ShapeError::UnnamedContainer { path, index })?;

    Ok(ContainerSpec {
        name,
        image: raw.image,
        image_pull_policy: raw.image_pull_policy,
        resources: raw.resources,
    })
}

/// Read the container list of a manifest.
///
/// The outer error covers a missing or mistyped list. Each container is
/// decoded independently so one bad entry does not hide the others. A
/// container without a name counts as malformed.
pub fn containers(
    object: &ManifestObject,
    location: PodSpecLocation,
) -> Result<Vec<Result<ContainerSpec, ShapeError>>, ShapeError> {
    let path = location.containers_path();

    let mut current = object;
    for segment in location.segments().iter().copied().chain(["containers"]) {
        current = current
            .get(segment)
            .filter(|value| !value.is_null())
            .ok_or(ShapeError::Missing { path })?;
    }

    let items = current.as_array().ok_or(ShapeError::NotAList { path })?;

    Ok(items
        .iter()
        .enumerate()
        .map(|(index, item)| decode_container(item, path, index))
        .collect())
}

/// Run `check` over every container, turning shape problems into violations
/// for `concern` instead of aborting.
pub fn check_containers<F>(
    object: &ManifestObject,
    location: PodSpecLocation,
    concern: &str,
    mut check: F,
) -> ValidationResult
where
    F: FnMut(&ContainerSpec, &mut ValidationResult),
{
    let mut result = ValidationResult::valid();

    match containers(object, location) {
        Ok(entries) => {
            for entry in entries {
                match entry {
                    Ok(container) => check(&container, &mut result),
                    Err(e) => result.reject(format!("Cannot check {}: {}", concern, e)),
                }
            }
        }
        Err(e) => result.reject(format!("Cannot check {}: {}", concern, e)),
    }

    result
}
