use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Placeholder for any version that could not be determined.
pub const UNKNOWN: &str = "Unknown";

/// Ordered `name -> version` mapping.
///
/// Iteration follows first insertion; inserting an existing name replaces
/// its version in place.
pub type DependencyMap = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub declared_version: String,
}

impl DependencyRecord {
    pub fn new(name: impl Into<String>, declared_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_version: declared_version.into(),
        }
    }

    /// A record whose version could not be recovered.
    pub fn unversioned(name: impl Into<String>) -> Self {
        Self::new(name, UNKNOWN)
    }

    pub fn has_known_version(&self) -> bool {
        self.declared_version != UNKNOWN
    }
}

impl std::fmt::Display for DependencyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.declared_version)
    }
}
