//! Kind → chain registry.
//!
//! Built once at startup from a declarative list of `(kind, chain)` pairs and
//! read-only afterwards. Lookups go through the canonical
//! `<group>/<version>/<kind>` key. A kind without an entry has no opinion.

use std::collections::HashMap;

use crate::webhooks::chain::Chain;
use crate::webhooks::kind::KindIdentity;
use crate::webhooks::policies::{
    ImageTagValidator, PodSpecLocation, PullPolicyValidator, ResourceRequirementsValidator,
};

/// Immutable mapping from kind identity to its validation chain
#[derive(Debug, Default)]
pub struct Registry {
    chains: HashMap<String, Chain>,
}

impl Registry {
    /// Build a registry from `(kind, chain)` entries. A later entry for the
    /// same kind replaces an earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = (KindIdentity, Chain)>) -> Self {
        let chains = entries
            .into_iter()
            .map(|(kind, chain)| (kind.registry_key(), chain))
            .collect();
        Self { chains }
    }

    /// The registry of built-in workload kinds
    pub fn builtin() -> Self {
        Self::from_entries(builtin_entries())
    }

    /// Find the chain registered for a kind
    pub fn lookup(&self, kind: &KindIdentity) -> Option<&Chain> {
        self.chains.get(&kind.registry_key())
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.chains.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// The standard chain for any kind carrying a pod spec at `location`
pub fn workload_chain(location: PodSpecLocation) -> Chain {
    Chain::new()
        .with(ImageTagValidator::new(location))
        .with(PullPolicyValidator::new(location))
        .with(ResourceRequirementsValidator::new(location))
}

/// Built-in kinds and where each keeps its pod spec
pub fn builtin_entries() -> Vec<(KindIdentity, Chain)> {
    [
        (KindIdentity::core("v1", "Pod"), PodSpecLocation::Pod),
        (
            KindIdentity::new("apps", "v1", "Deployment"),
            PodSpecLocation::PodTemplate,
        ),
        (
            KindIdentity::new("apps", "v1", "StatefulSet"),
            PodSpecLocation::PodTemplate,
        ),
        (
            KindIdentity::new("apps", "v1", "ReplicaSet"),
            PodSpecLocation::PodTemplate,
        ),
        (
            KindIdentity::new("apps", "v1", "DaemonSet"),
            PodSpecLocation::PodTemplate,
        ),
        (
            KindIdentity::new("batch", "v1", "Job"),
            PodSpecLocation::PodTemplate,
        ),
        (
            KindIdentity::new("batch", "v1", "CronJob"),
            PodSpecLocation::JobTemplate,
        ),
    ]
    .into_iter()
    .map(|(kind, location)| (kind, workload_chain(location)))
    .collect()
}
