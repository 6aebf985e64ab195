//! npm registry lookups.
//!
//! [`RegistryClient`] resolves two facts per dependency: the version the
//! `latest` dist-tag points at, and whether open security advisories exist
//! for the declared version. Neither lookup ever fails the run. A failed
//! lookup becomes [`Lookup::Unknown`] or [`SecurityFlag::Unknown`] and is
//! logged at `warn` level.
//!
//! Lookups are issued strictly one after another with a fixed delay between
//! version requests, to stay within the registry's fair-use limits.
//!
//! # Example
//!
//! ```no_run
//! use indicatif::ProgressBar;
//! use lockaudit::registry::{RegistryClient, RegistryConfig};
//! use lockaudit::DependencyRecord;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = RegistryClient::new(RegistryConfig::default())?;
//!     let records = vec![DependencyRecord::new("lodash", "4.17.20")];
//!
//!     let results = client.resolve_all(&records, &ProgressBar::hidden()).await;
//!     println!("latest lodash: {}", results.latest_version("lodash"));
//!     Ok(())
//! }
//! ```

mod advisory;
mod version;

use std::collections::HashMap;
use std::time::Duration;

use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AuditError, RegistryError, Result};
use crate::model::{DependencyRecord, SecurityFlag, UNKNOWN};

/// Public npm registry.
pub const NPM_REGISTRY: &str = "https://registry.npmjs.org";

pub const USER_AGENT: &str = concat!("lockaudit/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause between successive latest-version requests.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(500);

/// How advisory status is queried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisoryStrategy {
    /// One bulk request for the whole dependency list.
    #[default]
    Bulk,
    /// One single-entry bulk request per dependency, inside the throttled loop.
    PerPackage,
}

impl AdvisoryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisoryStrategy::Bulk => "bulk",
            AdvisoryStrategy::PerPackage => "per-package",
        }
    }
}

impl std::str::FromStr for AdvisoryStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bulk" => Ok(AdvisoryStrategy::Bulk),
            "per-package" | "per_package" | "single" => Ok(AdvisoryStrategy::PerPackage),
            _ => Err(format!(
                "Unknown advisory strategy: {}. Use 'bulk' or 'per-package'",
                s
            )),
        }
    }
}

impl std::fmt::Display for AdvisoryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub url: String,
    pub timeout: Duration,
    pub rate_limit: Duration,
    pub strategy: AdvisoryStrategy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: NPM_REGISTRY.to_string(),
            timeout: DEFAULT_TIMEOUT,
            rate_limit: DEFAULT_RATE_LIMIT,
            strategy: AdvisoryStrategy::default(),
        }
    }
}

impl RegistryConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_strategy(mut self, strategy: AdvisoryStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Outcome of one registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Resolved(T),
    Unknown { reason: RegistryError },
}

impl<T> Lookup<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Lookup::Resolved(_))
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Lookup::Resolved(value) => Some(value),
            Lookup::Unknown { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&RegistryError> {
        match self {
            Lookup::Resolved(_) => None,
            Lookup::Unknown { reason } => Some(reason),
        }
    }
}

impl<T> From<std::result::Result<T, RegistryError>> for Lookup<T> {
    fn from(result: std::result::Result<T, RegistryError>) -> Self {
        match result {
            Ok(value) => Lookup::Resolved(value),
            Err(reason) => Lookup::Unknown { reason },
        }
    }
}

impl Lookup<String> {
    /// The resolved value, or `"Unknown"`.
    pub fn value_or_unknown(&self) -> &str {
        self.resolved().map_or(UNKNOWN, String::as_str)
    }
}

/// Everything the registry reported for a dependency list, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RegistryResults {
    pub latest: HashMap<String, Lookup<String>>,
    pub security: HashMap<String, SecurityFlag>,
}

impl RegistryResults {
    pub fn latest_version(&self, name: &str) -> &str {
        self.latest
            .get(name)
            .map_or(UNKNOWN, Lookup::value_or_unknown)
    }

    pub fn security_flag(&self, name: &str) -> SecurityFlag {
        self.security
            .get(name)
            .copied()
            .unwrap_or(SecurityFlag::Unknown)
    }
}

pub struct RegistryClient {
    client: reqwest::Client,
    config: RegistryConfig,
}

impl RegistryClient {
    /// Creates a client with the configured timeout applied to every request.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Client`] if the TLS backend cannot be initialized.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(AuditError::Client)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Resolves latest versions and advisory status for `records`.
    ///
    /// Requests run one at a time. With [`AdvisoryStrategy::Bulk`] the
    /// advisory lookup is a single request made before the version loop.
    pub async fn resolve_all(
        &self,
        records: &[DependencyRecord],
        progress: &ProgressBar,
    ) -> RegistryResults {
        let mut results = RegistryResults::default();

        info!(
            packages = records.len(),
            strategy = %self.config.strategy,
            "querying registry"
        );

        if self.config.strategy == AdvisoryStrategy::Bulk {
            results.security = self.fetch_security_status(records).await;
        }

        for (i, record) in records.iter().enumerate() {
            if i > 0 && !self.config.rate_limit.is_zero() {
                tokio::time::sleep(self.config.rate_limit).await;
            }
            progress.set_message(record.name.clone());

            let latest = self.fetch_latest_version(&record.name).await;
            results.latest.insert(record.name.clone(), latest);

            if self.config.strategy == AdvisoryStrategy::PerPackage {
                let status = self
                    .fetch_security_status(std::slice::from_ref(record))
                    .await;
                results.security.extend(status);
            }

            progress.inc(1);
        }

        results
    }
}
