//! Directory-side value types.

use serde::{Deserialize, Serialize};

/// Opaque key used to query the directory: a user's email or a group's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for GroupKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// A group returned by the directory for some key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredGroup {
    /// External display name, not yet normalized.
    pub name: String,
    /// Key for looking up this group's own memberships.
    pub id: GroupKey,
}

impl DiscoveredGroup {
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<GroupKey>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Outcome of a transitive group discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryResult {
    /// Group names in traversal order. May contain duplicates.
    pub names: Vec<String>,
    /// Number of directory lookups performed.
    pub lookups: usize,
}

impl DiscoveryResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}
