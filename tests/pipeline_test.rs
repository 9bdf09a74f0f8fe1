//! End-to-end pipeline tests: resolve, submit, record
//!
//! A scheduler wired to mock servers executes single triggers; each test
//! asserts on the terminal ledger row the pipeline guarantee requires.

use chrono::Local;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cadence::config::Config;
use cadence::content::SourceSpec;
use cadence::models::{PostStatus, PostType};
use cadence::notifications::NoopNotifier;
use cadence::scheduler::Scheduler;
use cadence::storage::{PostLedger, SqliteLedger};

fn test_config(endpoint: String, sources: Vec<SourceSpec>) -> Config {
    let mut config = Config::default();
    config.poster.endpoint = endpoint;
    config.poster.api_key = String::from("test-key");
    config.content.sources = sources;
    config.content.source_timeout_secs = 2;
    config.retry.max_attempts = 2;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config
}

fn quote_source(base: &str) -> SourceSpec {
    SourceSpec {
        name: String::from("Quotes API"),
        url: format!("{base}/quote"),
        content_key: String::from("content"),
        author_key: None,
        punchline_key: None,
        title_key: None,
    }
}

/// Test a healthy trigger: source content delivered and one success row
#[tokio::test]
async fn test_trigger_success_records_one_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "Ship it."
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(
        format!("{}/posts", mock_server.uri()),
        vec![quote_source(&mock_server.uri())],
    );
    let ledger = Arc::new(SqliteLedger::in_memory().unwrap());
    let scheduler = Scheduler::new(config, ledger.clone(), Arc::new(NoopNotifier)).unwrap();

    let now = Local::now().naive_local();
    let attempt = scheduler.execute(PostType::Scheduled, now).await;

    assert_eq!(attempt.status, PostStatus::Success);
    assert_eq!(attempt.source_used.as_deref(), Some("Quotes API"));
    assert_eq!(attempt.content_snapshot, "Ship it.");

    let today = Local::now().date_naive();
    assert_eq!(ledger.count_for_day(today, None).unwrap(), 1);
    let stats = ledger.daily_stats(today).unwrap();
    assert_eq!(stats.successful_posts, 1);
    assert_eq!(stats.scheduled_posts, 1);
}

/// Test degraded content: sources down, fallback body still delivered
#[tokio::test]
async fn test_trigger_uses_fallback_when_sources_fail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = test_config(
        format!("{}/posts", mock_server.uri()),
        vec![quote_source(&mock_server.uri())],
    );
    let ledger = Arc::new(SqliteLedger::in_memory().unwrap());
    let scheduler = Scheduler::new(config, ledger.clone(), Arc::new(NoopNotifier)).unwrap();

    let attempt = scheduler
        .execute(PostType::Random, Local::now().naive_local())
        .await;

    assert_eq!(attempt.status, PostStatus::Success);
    assert_eq!(attempt.source_used.as_deref(), Some("fallback"));
    assert!(!attempt.content_snapshot.is_empty());

    let today = Local::now().date_naive();
    assert_eq!(
        ledger.count_for_day(today, Some(PostType::Random)).unwrap(),
        1
    );
}

/// Test endpoint rejection: exactly one delivery call and one failure row
#[tokio::test]
async fn test_trigger_auth_failure_records_failure_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "Unpublishable."
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1) // Terminal rejection, no retry
        .mount(&mock_server)
        .await;

    let config = test_config(
        format!("{}/posts", mock_server.uri()),
        vec![quote_source(&mock_server.uri())],
    );
    let ledger = Arc::new(SqliteLedger::in_memory().unwrap());
    let scheduler = Scheduler::new(config, ledger.clone(), Arc::new(NoopNotifier)).unwrap();

    let attempt = scheduler
        .execute(PostType::Scheduled, Local::now().naive_local())
        .await;

    assert_eq!(attempt.status, PostStatus::Failure);
    let detail = attempt.error_detail.expect("failure must carry detail");
    assert!(detail.contains("401"), "Detail should name the status: {detail}");

    let today = Local::now().date_naive();
    let stats = ledger.daily_stats(today).unwrap();
    assert_eq!(stats.total_posts, 1);
    assert_eq!(stats.failed_posts, 1);
    assert_eq!(stats.successful_posts, 0);
}

/// Test manual trigger outside the plan records a TEST row
#[tokio::test]
async fn test_post_now_records_test_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "Manual check."
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = test_config(
        format!("{}/posts", mock_server.uri()),
        vec![quote_source(&mock_server.uri())],
    );
    let ledger = Arc::new(SqliteLedger::in_memory().unwrap());
    let scheduler = Scheduler::new(config, ledger.clone(), Arc::new(NoopNotifier)).unwrap();

    let attempt = scheduler.post_now(PostType::Test).await;

    assert_eq!(attempt.status, PostStatus::Success);
    assert_eq!(attempt.post_type, PostType::Test);

    let today = Local::now().date_naive();
    assert_eq!(
        ledger.count_for_day(today, Some(PostType::Test)).unwrap(),
        1
    );

    // A manual trigger must never count against the planned post types
    let stats = ledger.daily_stats(today).unwrap();
    assert_eq!(stats.scheduled_posts, 0);
    assert_eq!(stats.random_posts, 0);
    assert_eq!(stats.total_posts, 1);
}
