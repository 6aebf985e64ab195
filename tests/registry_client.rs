//! Integration tests for RegistryClient.
//!
//! Uses wiremock for HTTP mocking. Covers latest-version lookups, the bulk
//! advisory call, both advisory strategies and the rate-limit delay.

mod common;

use std::time::{Duration, Instant};

use common::{advisory, mount_latest, test_client, BULK_PATH};
use indicatif::ProgressBar;
use lockaudit::{
    AdvisoryStrategy, DependencyRecord, Lookup, RegistryClient, RegistryConfig, RegistryError,
    SecurityFlag, UNKNOWN,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_latest_version_success() {
    let server = MockServer::start().await;
    mount_latest(&server, "/lodash", "4.17.21").await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    let lookup = client.fetch_latest_version("lodash").await;

    assert_eq!(lookup, Lookup::Resolved("4.17.21".to_string()));
}

#[tokio::test]
async fn test_fetch_latest_version_sends_user_agent() {
    let server = MockServer::start().await;
    let body = json!({"dist-tags": {"latest": "4.17.21"}});

    Mock::given(method("GET"))
        .and(path("/lodash"))
        .and(header("user-agent", lockaudit::registry::USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    assert!(client.fetch_latest_version("lodash").await.is_resolved());
}

#[tokio::test]
async fn test_fetch_latest_version_scoped_package() {
    let server = MockServer::start().await;
    mount_latest(&server, "/@babel%2Fcore", "7.24.0").await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    let lookup = client.fetch_latest_version("@babel/core").await;

    assert_eq!(lookup.value_or_unknown(), "7.24.0");
}

#[tokio::test]
async fn test_fetch_latest_version_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/no-such-package"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    let lookup = client.fetch_latest_version("no-such-package").await;

    assert_eq!(lookup.value_or_unknown(), UNKNOWN);
    assert_eq!(
        lookup.reason(),
        Some(&RegistryError::Status { status: 404 })
    );
}

#[tokio::test]
async fn test_fetch_latest_version_missing_dist_tag() {
    let server = MockServer::start().await;
    let body = json!({"dist-tags": {"next": "2.0.0-rc.1"}});

    Mock::given(method("GET"))
        .and(path("/untagged"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    let lookup = client.fetch_latest_version("untagged").await;

    assert_eq!(lookup.reason(), Some(&RegistryError::MissingLatest));
}

#[tokio::test]
async fn test_fetch_latest_version_invalid_body() {
    let server = MockServer::start().await;
    let page = ResponseTemplate::new(200).set_body_string("<html>oops</html>");

    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(page)
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    let lookup = client.fetch_latest_version("garbled").await;

    assert!(matches!(
        lookup.reason(),
        Some(RegistryError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_fetch_latest_version_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"dist-tags": {"latest": "1.0.0"}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = RegistryConfig::default()
        .with_url(server.uri())
        .with_timeout(Duration::from_millis(200));
    let client = RegistryClient::new(config).unwrap();

    let lookup = client.fetch_latest_version("slow").await;

    assert_eq!(
        lookup.reason(),
        Some(&RegistryError::Timeout(Duration::from_millis(200)))
    );
}

#[tokio::test]
async fn test_fetch_security_status_bulk_flags() {
    let server = MockServer::start().await;
    let advisories = json!({
        "lodash": [advisory(1523, "Prototype Pollution in lodash")],
        "minimist": []
    });

    Mock::given(method("POST"))
        .and(path(BULK_PATH))
        .and(body_json(json!({
            "left-pad": ["1.3.0"],
            "lodash": ["4.17.20"],
            "minimist": ["1.2.0"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(advisories))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    let batch = vec![
        DependencyRecord::new("lodash", "4.17.20"),
        DependencyRecord::new("minimist", "1.2.0"),
        DependencyRecord::new("left-pad", "1.3.0"),
    ];

    let status = client.fetch_security_status(&batch).await;

    assert_eq!(status.len(), 3);
    assert_eq!(status["lodash"], SecurityFlag::Yes);
    assert_eq!(status["minimist"], SecurityFlag::No);
    assert_eq!(status["left-pad"], SecurityFlag::No);
}

#[tokio::test]
async fn test_fetch_security_status_failure_marks_batch_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(BULK_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    let batch = vec![
        DependencyRecord::new("lodash", "4.17.20"),
        DependencyRecord::new("minimist", "1.2.0"),
    ];

    let status = client.fetch_security_status(&batch).await;

    assert_eq!(status.len(), 2);
    assert!(status.values().all(|flag| *flag == SecurityFlag::Unknown));
}

#[tokio::test]
async fn test_fetch_security_status_invalid_body_marks_batch_unknown() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(BULK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("[1, 2, 3]"))
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    let status = client
        .fetch_security_status(&[DependencyRecord::new("lodash", "4.17.20")])
        .await;

    assert_eq!(status["lodash"], SecurityFlag::Unknown);
}

#[tokio::test]
async fn test_fetch_security_status_unknown_version_not_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(BULK_PATH))
        .and(body_json(json!({"lodash": ["4.17.21"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    let batch = vec![
        DependencyRecord::new("lodash", "4.17.21"),
        DependencyRecord::unversioned("mystery"),
    ];

    let status = client.fetch_security_status(&batch).await;

    assert_eq!(status["lodash"], SecurityFlag::No);
    assert_eq!(status["mystery"], SecurityFlag::Unknown);
}

#[tokio::test]
async fn test_fetch_security_status_empty_batch_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(BULK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    assert!(client.fetch_security_status(&[]).await.is_empty());
}

#[tokio::test]
async fn test_resolve_all_bulk_makes_one_advisory_call() {
    let server = MockServer::start().await;
    mount_latest(&server, "/lodash", "4.17.21").await;
    mount_latest(&server, "/zod", "3.23.8").await;
    let advisories = json!({
        "lodash": [advisory(1523, "Prototype Pollution in lodash")]
    });

    Mock::given(method("POST"))
        .and(path(BULK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(advisories))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::Bulk);
    let records = vec![
        DependencyRecord::new("lodash", "4.17.20"),
        DependencyRecord::new("zod", "3.22.0"),
    ];

    let results = client.resolve_all(&records, &ProgressBar::hidden()).await;

    assert_eq!(results.latest_version("lodash"), "4.17.21");
    assert_eq!(results.latest_version("zod"), "3.23.8");
    assert_eq!(results.security_flag("lodash"), SecurityFlag::Yes);
    assert_eq!(results.security_flag("zod"), SecurityFlag::No);
}

#[tokio::test]
async fn test_resolve_all_per_package_isolates_failures() {
    let server = MockServer::start().await;
    mount_latest(&server, "/lodash", "4.17.21").await;
    mount_latest(&server, "/zod", "3.23.8").await;

    Mock::given(method("POST"))
        .and(path(BULK_PATH))
        .and(body_json(json!({"lodash": ["4.17.20"]})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(BULK_PATH))
        .and(body_json(json!({"zod": ["3.22.0"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server, AdvisoryStrategy::PerPackage);
    let records = vec![
        DependencyRecord::new("lodash", "4.17.20"),
        DependencyRecord::new("zod", "3.22.0"),
    ];

    let results = client.resolve_all(&records, &ProgressBar::hidden()).await;

    assert_eq!(results.security_flag("lodash"), SecurityFlag::Unknown);
    assert_eq!(results.security_flag("zod"), SecurityFlag::No);
    assert_eq!(results.latest_version("lodash"), "4.17.21");
    assert_eq!(results.latest_version("zod"), "3.23.8");
}

#[tokio::test]
async fn test_resolve_all_waits_between_version_lookups() {
    let server = MockServer::start().await;
    mount_latest(&server, "/a", "1.0.0").await;
    mount_latest(&server, "/b", "1.0.0").await;
    mount_latest(&server, "/c", "1.0.0").await;

    Mock::given(method("POST"))
        .and(path(BULK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let config = RegistryConfig::default()
        .with_url(server.uri())
        .with_rate_limit(Duration::from_millis(150));
    let client = RegistryClient::new(config).unwrap();
    let records = vec![
        DependencyRecord::new("a", "1.0.0"),
        DependencyRecord::new("b", "1.0.0"),
        DependencyRecord::new("c", "1.0.0"),
    ];

    let started = Instant::now();
    client.resolve_all(&records, &ProgressBar::hidden()).await;

    // Two gaps between three lookups
    assert!(started.elapsed() >= Duration::from_millis(300));
}
