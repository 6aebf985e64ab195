//! Yarn v1 lockfile parsing.
//!
//! A lockfile block looks like:
//!
//! ```text
//! "@babel/core@^7.20.0", "@babel/core@^7.12.3":
//!   version "7.20.0"
//!   resolved "https://registry.yarnpkg.com/@babel/core/-/core-7.20.0.tgz"
//! ```
//!
//! Only the header and the `version` line matter. Anything else is skipped
//! without error.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{AuditError, Result};
use crate::model::DependencyMap;

#[derive(Debug, Default)]
pub struct LockfileParser;

impl LockfileParser {
    pub fn new() -> Self {
        Self
    }

    /// Reads and parses a lockfile.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Lockfile`] if the file cannot be read.
    pub fn parse_file(&self, path: &Path) -> Result<DependencyMap> {
        let content = fs::read_to_string(path).map_err(|source| AuditError::Lockfile {
            path: path.to_path_buf(),
            source,
        })?;

        let dependencies = self.parse_str(&content);
        debug!(
            path = %path.display(),
            count = dependencies.len(),
            "parsed lockfile"
        );
        Ok(dependencies)
    }

    /// Parses lockfile text into an ordered `name -> version` map.
    ///
    /// A later block for an already seen name replaces its version.
    pub fn parse_str(&self, content: &str) -> DependencyMap {
        let mut dependencies = DependencyMap::new();
        let mut pending: Option<String> = None;

        for line in content.lines() {
            let trimmed = line.trim();

            if let Some(name) = parse_header(trimmed) {
                pending = Some(name);
            } else if let Some(version) = parse_version_line(trimmed) {
                // Aliases listed on separate headers before one version line
                // collapse to the most recent header.
                if let Some(name) = pending.take() {
                    dependencies.insert(name, version.to_string());
                }
            }
        }

        dependencies
    }
}

/// Extracts the package name from a block header such as
/// `"lodash@^4.17.21":` or `"@scope/pkg@^1.0.0", "@scope/pkg@^1.1.0":`.
fn parse_header(line: &str) -> Option<String> {
    if line.starts_with('#') {
        return None;
    }
    let specs = line.strip_suffix(':')?;
    let first = specs.split(',').next()?.trim().trim_matches('"');
    extract_package_name(first).map(str::to_string)
}

/// Splits `name@range`, keeping a leading scope `@` with the name and
/// splitting on the first `@` after it.
fn extract_package_name(spec: &str) -> Option<&str> {
    let offset = usize::from(spec.starts_with('@'));
    let at_pos = spec[offset..].find('@')? + offset;

    let (name, range) = (&spec[..at_pos], &spec[at_pos + 1..]);
    if name.len() <= offset || range.is_empty() {
        return None;
    }
    Some(name)
}

/// Matches `version "1.2.3"` and returns the quoted version.
fn parse_version_line(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("version")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let version = rest.trim().strip_prefix('"')?.strip_suffix('"')?;
    if version.is_empty() {
        return None;
    }
    Some(version)
}
