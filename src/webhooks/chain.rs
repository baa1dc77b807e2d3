//! Ordered validator chains.
//!
//! A chain runs every validator against the same object, regardless of
//! earlier failures, and merges the results: validity is the AND of all
//! validators, errors are concatenated in validator order.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::error;

use crate::webhooks::policies::{ManifestObject, ValidationResult, Validator};

/// Ordered sequence of validators for one resource kind
#[derive(Default)]
pub struct Chain {
    validators: Vec<Box<dyn Validator>>,
}

impl Chain {
    /// Create an empty chain (vacuously valid)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validator
    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Names of the validators, in execution order
    pub fn validator_names(&self) -> Vec<&str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every validator and aggregate the outcome.
    ///
    /// A validator that panics is recorded as a failure of that validator
    /// alone; the rest of the chain still runs.
    pub fn validate(&self, object: &ManifestObject) -> ValidationResult {
        let mut result = ValidationResult::valid();

        for validator in &self.validators {
            let outcome = catch_unwind(AssertUnwindSafe(|| validator.validate(object)));
            match outcome {
                Ok(partial) => result.merge(partial),
                Err(_) => {
                    error!(validator = validator.name(), "Validator panicked");
                    result.reject(format!(
                        "Validator {} failed unexpectedly",
                        validator.name()
                    ));
                }
            }
        }

        result
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("validators", &self.validator_names())
            .finish()
    }
}
