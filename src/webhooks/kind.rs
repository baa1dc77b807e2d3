//! Resource kind identity used as the registry key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The `(group, version, kind)` triple of a manifest.
///
/// The group is empty for the core API group. The canonical string form is
/// `<group>/<version>/<kind>`, so core kinds render with a leading slash
/// (`/v1/Pod`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindIdentity {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl KindIdentity {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Kind in the core API group (empty group).
    pub fn core(version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new("", version, kind)
    }

    /// Canonical registry key
    pub fn registry_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KindIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.group, self.version, self.kind)
    }
}
