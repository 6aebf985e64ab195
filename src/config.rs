//! Configuration file handling.
//!
//! Settings are read from a TOML file. Command-line flags override them.
//!
//! # Configuration Location
//!
//! - Linux: `~/.config/lockaudit/config.toml`
//! - macOS: `~/Library/Application Support/lockaudit/config.toml`
//! - Windows: `%APPDATA%\lockaudit\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! registry_url = "https://registry.npmjs.org"
//! advisory_strategy = "bulk"
//! request_timeout_secs = 10
//! rate_limit_ms = 500
//! manifest_path = "dependencies.json"
//! output_path = "dependency_analysis.csv"
//! report_format = "csv"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AuditError, Result};
use crate::registry::{AdvisoryStrategy, RegistryConfig, NPM_REGISTRY};
use crate::report::ReportFormat;

/// Application configuration.
///
/// Missing keys fall back to their defaults.
///
/// # Example
///
/// ```no_run
/// use lockaudit::Config;
///
/// let config = Config::load().unwrap();
/// println!("Registry: {}", config.registry_url);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the npm-compatible registry.
    ///
    /// Default: `https://registry.npmjs.org`
    pub registry_url: String,

    /// How advisories are queried: `"bulk"` or `"per-package"`.
    ///
    /// Default: `"bulk"`
    pub advisory_strategy: AdvisoryStrategy,

    /// Timeout applied to every registry request, in seconds.
    ///
    /// Default: 10
    pub request_timeout_secs: u64,

    /// Delay between successive latest-version requests, in milliseconds.
    ///
    /// Default: 500
    pub rate_limit_ms: u64,

    /// Where the intermediate manifest is written.
    ///
    /// Default: `dependencies.json`
    pub manifest_path: PathBuf,

    /// Where the report is written.
    ///
    /// Default: `dependency_analysis.csv`
    pub output_path: PathBuf,

    /// Report file format: `"csv"` or `"json"`.
    ///
    /// Default: `"csv"`
    pub report_format: ReportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_url: NPM_REGISTRY.to_string(),
            advisory_strategy: AdvisoryStrategy::Bulk,
            request_timeout_secs: 10,
            rate_limit_ms: 500,
            manifest_path: PathBuf::from("dependencies.json"),
            output_path: PathBuf::from("dependency_analysis.csv"),
            report_format: ReportFormat::Csv,
        }
    }
}

impl Config {
    /// Loads configuration from the default config file.
    ///
    /// If the file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
        toml::from_str(&content).map_err(|e| AuditError::Config {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Saves the configuration to `path`, creating the parent directory if
    /// needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| AuditError::io(parent, e))?;
            }
        }

        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| AuditError::io(path, e))
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lockaudit")
            .join("config.toml")
    }

    /// Renders these settings as the TOML a config file would hold.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AuditError::Config {
            message: e.to_string(),
        })
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default()
            .with_url(self.registry_url.clone())
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_rate_limit(Duration::from_millis(self.rate_limit_ms))
            .with_strategy(self.advisory_strategy)
    }
}
