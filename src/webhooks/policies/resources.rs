//! Resource requirements completeness policy.
//!
//! Every container must declare CPU and memory limits. Requests follow the
//! Kubernetes defaulting rule: omitted requests default to the limits, so a
//! missing `requests` block is only a violation when `limits` is missing
//! too. An explicit `requests` block must name both CPU and memory.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use super::{
    ContainerSpec, ManifestObject, PodSpecLocation, ValidationResult, Validator, check_containers,
};

const CPU: &str = "cpu";
const MEMORY: &str = "memory";

/// Requires CPU/memory limits and requests on every container.
#[derive(Clone, Debug)]
pub struct ResourceRequirementsValidator {
    location: PodSpecLocation,
}

impl ResourceRequirementsValidator {
    pub fn new(location: PodSpecLocation) -> Self {
        Self { location }
    }
}

impl Validator for ResourceRequirementsValidator {
    fn name(&self) -> &str {
        "resource-requirements"
    }

    fn validate(&self, object: &ManifestObject) -> ValidationResult {
        check_containers(object, self.location, "resource requirements", check_container)
    }
}

fn check_container(container: &ContainerSpec, result: &mut ValidationResult) {
    let name = &container.name;

    let Some(resources) = &container.resources else {
        result.reject(format!(
            "Container {} does not have resource requirements set",
            name
        ));
        return;
    };

    match &resources.limits {
        None => result.reject(format!(
            "Container {} does not have resource limits set",
            name
        )),
        Some(limits) => check_quantities(name, "limits", limits, result),
    }

    match (&resources.requests, &resources.limits) {
        (None, None) => result.reject(format!(
            "Container {} does not have resource requests set",
            name
        )),
        (Some(requests), _) => check_quantities(name, "requests", requests, result),
        // Requests default to limits
        (None, Some(_)) => {}
    }
}

fn check_quantities(
    name: &str,
    section: &str,
    quantities: &BTreeMap<String, Quantity>,
    result: &mut ValidationResult,
) {
    if !quantities.contains_key(CPU) {
        result.reject(format!(
            "Container {} does not have CPU {} set",
            name, section
        ));
    }
    if !quantities.contains_key(MEMORY) {
        result.reject(format!(
            "Container {} does not have memory {} set",
            name, section
        ));
    }
}
