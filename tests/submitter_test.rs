//! Integration tests for the delivery submitter using wiremock
//!
//! These tests validate retry behavior against the transient/terminal
//! failure classification.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cadence::config::PosterConfig;
use cadence::content::ResolvedContent;
use cadence::poster::{PostPayload, SubmitOutcome, Submitter};
use cadence::utils::RetryConfig;

fn poster_config(endpoint: String) -> PosterConfig {
    PosterConfig {
        endpoint,
        api_key: String::from("test-key"),
        ..PosterConfig::default()
    }
}

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_delay_ms: 1,
        max_delay_ms: 5,
        backoff_multiplier: 2.0,
    }
}

fn payload() -> PostPayload {
    PostPayload::from_resolved(&ResolvedContent {
        content: String::from("An inspiring thought for the afternoon."),
        title: Some(String::from("Daily Post")),
        source_used: String::from("Quotes API"),
    })
}

/// Test successful delivery on the first attempt
#[tokio::test]
async fn test_submit_success_first_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let submitter = Submitter::new(
        poster_config(format!("{}/posts", mock_server.uri())),
        fast_retry(3),
    )
    .unwrap();

    let outcome = submitter.submit(&payload()).await;
    assert!(outcome.is_success(), "Should deliver: {outcome:?}");
    assert_eq!(outcome.attempts(), 1);
}

/// Test that server errors are retried until success
#[tokio::test]
async fn test_server_error_then_success() {
    let mock_server = MockServer::start().await;

    // Return 500 twice, then succeed
    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let submitter = Submitter::new(
        poster_config(format!("{}/posts", mock_server.uri())),
        fast_retry(5),
    )
    .unwrap();

    let outcome = submitter.submit(&payload()).await;
    assert!(outcome.is_success(), "Should succeed after retries");
    assert_eq!(outcome.attempts(), 3);
}

/// Test that a 401 rejection is terminal and never retried
#[tokio::test]
async fn test_auth_rejection_no_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1) // Should only be called once (no retry)
        .mount(&mock_server)
        .await;

    let submitter = Submitter::new(
        poster_config(format!("{}/posts", mock_server.uri())),
        fast_retry(5),
    )
    .unwrap();

    let outcome = submitter.submit(&payload()).await;
    match outcome {
        SubmitOutcome::Failure { attempts, error } => {
            assert_eq!(attempts, 1);
            assert!(error.contains("401"), "Error should carry status: {error}");
        }
        SubmitOutcome::Success { .. } => panic!("401 must not be a success"),
    }
}

/// Test attempt budget exhaustion on persistent server errors
#[tokio::test]
async fn test_attempt_budget_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let submitter = Submitter::new(
        poster_config(format!("{}/posts", mock_server.uri())),
        fast_retry(3),
    )
    .unwrap();

    let outcome = submitter.submit(&payload()).await;
    assert!(!outcome.is_success());
    assert_eq!(outcome.attempts(), 3);
}

/// Test the endpoint probe distinguishes reachable from down
#[tokio::test]
async fn test_probe_reachable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(405)) // Any non-5xx answer counts
        .mount(&mock_server)
        .await;

    let submitter = Submitter::new(
        poster_config(format!("{}/posts", mock_server.uri())),
        fast_retry(1),
    )
    .unwrap();

    assert!(submitter.probe().await);
}
