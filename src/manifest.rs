//! The intermediate dependency manifest.
//!
//! The manifest is the parsed lockfile persisted as a JSON tree, in the
//! shape `yarn list --json` produces:
//!
//! ```json
//! {
//!   "type": "tree",
//!   "data": {
//!     "type": "list",
//!     "trees": [
//!       { "name": "lodash@4.17.21" }
//!     ]
//!   }
//! }
//! ```
//!
//! Encoding a [`DependencyMap`] and decoding the result yields the same
//! name/version pairs in the same order, provided no version contains `@`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuditError, Result};
use crate::model::{DependencyMap, DependencyRecord};

const DOCUMENT_TYPE: &str = "tree";
const LIST_TYPE: &str = "list";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDocument {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub data: ManifestData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestData {
    #[serde(rename = "type")]
    pub data_type: String,
    pub trees: Vec<ManifestEntry>,
}

/// A single `name@version` leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
}

impl ManifestDocument {
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.data.trees
    }

    /// Renders the document as indented JSON.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a document, rejecting anything without the expected envelope.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Structural`] for invalid JSON, missing `type`,
    /// `data` or `trees` fields, or entries whose `name` is not a string.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| AuditError::Structural {
            message: e.to_string(),
        })
    }
}

/// Builds a manifest from a parsed lockfile, preserving map order.
pub fn encode(dependencies: &DependencyMap) -> ManifestDocument {
    let trees = dependencies
        .iter()
        .map(|(name, version)| ManifestEntry {
            name: format!("{}@{}", name, version),
        })
        .collect();

    ManifestDocument {
        doc_type: DOCUMENT_TYPE.to_string(),
        data: ManifestData {
            data_type: LIST_TYPE.to_string(),
            trees,
        },
    }
}

/// Recovers dependency records from a manifest, in entry order.
pub fn decode(document: &ManifestDocument) -> Vec<DependencyRecord> {
    document
        .entries()
        .iter()
        .map(|entry| split_entry(&entry.name))
        .collect()
}

/// Splits `name@version` on the last `@` past the first character, so a
/// scope marker is never mistaken for the separator.
pub fn split_entry(entry: &str) -> DependencyRecord {
    let head = entry.chars().next().map_or(0, char::len_utf8);

    match entry[head..].rfind('@') {
        Some(pos) => {
            let at_pos = head + pos;
            let version = &entry[at_pos + 1..];
            if version.is_empty() {
                DependencyRecord::unversioned(&entry[..at_pos])
            } else {
                DependencyRecord::new(&entry[..at_pos], version)
            }
        }
        None => DependencyRecord::unversioned(entry),
    }
}

/// Encodes `dependencies` and writes the manifest to `path`, replacing any
/// existing file.
pub fn write_manifest(path: &Path, dependencies: &DependencyMap) -> Result<ManifestDocument> {
    let document = encode(dependencies);
    let json = document.to_pretty_json()?;
    fs::write(path, json).map_err(|e| AuditError::io(path, e))?;

    debug!(
        path = %path.display(),
        entries = document.entries().len(),
        "wrote manifest"
    );
    Ok(document)
}

/// Reads a manifest from disk.
pub fn read_manifest(path: &Path) -> Result<ManifestDocument> {
    let content = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
    ManifestDocument::from_json(&content)
}
