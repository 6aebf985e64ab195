#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lockaudit::{AdvisoryStrategy, RegistryClient, RegistryConfig};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const BULK_PATH: &str = "/-/npm/v1/security/advisories/bulk";

/// Temporary working directory for lockfiles, manifests and reports.
pub struct TempProject {
    pub dir: TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(relative_path);
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn file_path(&self, relative_path: &str) -> PathBuf {
        self.dir.path().join(relative_path)
    }

    pub fn read(&self, relative_path: &str) -> String {
        fs::read_to_string(self.file_path(relative_path)).expect("Failed to read file")
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Three packages, deliberately not in alphabetical order.
pub fn sample_yarn_lock() -> &'static str {
    r#"# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.
# yarn lockfile v1


"zod@^3.22.0":
  version "3.22.0"
  resolved "https://registry.yarnpkg.com/zod/-/zod-3.22.0.tgz"

"@babel/core@^7.20.0":
  version "7.20.0"
  dependencies:
    "@babel/types" "^7.20.0"

"lodash@^4.17.20":
  version "4.17.20"
"#
}

pub fn test_client(server: &MockServer, strategy: AdvisoryStrategy) -> RegistryClient {
    let config = RegistryConfig::default()
        .with_url(server.uri())
        .with_rate_limit(Duration::ZERO)
        .with_timeout(Duration::from_secs(2))
        .with_strategy(strategy);
    RegistryClient::new(config).expect("failed to create client")
}

pub async fn mount_latest(server: &MockServer, package_path: &str, latest: &str) {
    let metadata = json!({
        "name": package_path.trim_start_matches('/'),
        "dist-tags": { "latest": latest },
        "versions": {}
    });
    Mock::given(method("GET"))
        .and(path(package_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(metadata))
        .mount(server)
        .await;
}

/// Latest-version mocks for every package in [`sample_yarn_lock`].
pub async fn mount_sample_latest(server: &MockServer) {
    mount_latest(server, "/zod", "3.23.8").await;
    mount_latest(server, "/@babel%2Fcore", "7.24.0").await;
    mount_latest(server, "/lodash", "4.17.21").await;
}

pub fn advisory(id: u64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "url": format!("https://github.com/advisories/GHSA-{}", id),
        "title": title,
        "severity": "high",
        "vulnerable_versions": "<4.17.21"
    })
}
