//! Delivery to the posting API with bounded retry
//!
//! Retry applies only to transient failure classes (network errors,
//! timeouts, 5xx). A 4xx response is an auth/validation rejection and is
//! terminal on the spot. The submitter returns a tagged outcome rather
//! than an error so the caller always reaches its single ledger write.

use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PosterConfig;
use crate::utils::RetryConfig;

use super::payload::PostPayload;

/// How much of an error response body is kept as failure detail
const DETAIL_MAX: usize = 200;

/// Classified delivery failure
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Network/timeout/5xx - worth retrying
    #[error("Transient delivery failure: {0}")]
    Transient(String),

    /// 4xx auth/validation rejection - retrying cannot help
    #[error("Terminal delivery failure (HTTP {status}): {detail}")]
    Terminal { status: u16, detail: String },
}

impl DeliveryError {
    /// Whether another attempt could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Outcome of one full submit call (all internal attempts included)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Delivered; `attempts` counts calls made including the successful one
    Success { attempts: u32, status: u16 },

    /// Gave up; `error` carries the last failure detail
    Failure { attempts: u32, error: String },
}

impl SubmitOutcome {
    /// Whether the post was delivered
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Number of delivery attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Failure { attempts, .. } => *attempts,
        }
    }
}

/// Formats and delivers post payloads to the posting endpoint
pub struct Submitter {
    client: Client,
    config: PosterConfig,
    retry: RetryConfig,
}

impl Submitter {
    /// Create a submitter for the configured endpoint
    pub fn new(config: PosterConfig, retry: RetryConfig) -> Result<Self, reqwest::Error> {
        let mut headers = header::HeaderMap::new();
        if let Ok(value) = header::HeaderValue::from_str(&config.api_key) {
            headers.insert("x-api-key", value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(format!("cadence/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    /// Deliver a payload, retrying transient failures up to the attempt budget
    pub async fn submit(&self, payload: &PostPayload) -> SubmitOutcome {
        let mut last_error = String::from("no delivery attempt made");

        for attempt in 1..=self.retry.max_attempts {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }

            match self.deliver_once(payload).await {
                Ok(status) => {
                    info!(attempt, status, "Post delivered");
                    return SubmitOutcome::Success { attempts: attempt, status };
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "Delivery attempt failed, will retry"
                    );
                    last_error = e.to_string();
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Terminal delivery failure, not retrying");
                    return SubmitOutcome::Failure {
                        attempts: attempt,
                        error: e.to_string(),
                    };
                }
            }
        }

        SubmitOutcome::Failure {
            attempts: self.retry.max_attempts,
            error: last_error,
        }
    }

    /// One delivery attempt; classifies the response by status class
    async fn deliver_once(&self, payload: &PostPayload) -> Result<u16, DeliveryError> {
        // A multipart form is consumed on send, so it is rebuilt per attempt
        let form = payload.to_form(&self.config);

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Transient(e.to_string()))?;

        let status = response.status();

        if status.is_success() {
            return Ok(status.as_u16());
        }

        let detail = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(DETAIL_MAX)
            .collect::<String>();

        if status.is_client_error() {
            Err(DeliveryError::Terminal {
                status: status.as_u16(),
                detail,
            })
        } else {
            Err(DeliveryError::Transient(format!(
                "HTTP {}: {detail}",
                status.as_u16()
            )))
        }
    }

    /// Check whether the posting endpoint is reachable
    ///
    /// Any response below the 5xx class counts as reachable: a 401/404 on a
    /// bare GET still proves the endpoint answers.
    pub async fn probe(&self) -> bool {
        match self.client.get(&self.config.endpoint).send().await {
            Ok(response) => {
                let reachable = response.status() < StatusCode::INTERNAL_SERVER_ERROR;
                debug!(status = response.status().as_u16(), reachable, "Endpoint probe");
                reachable
            }
            Err(e) => {
                warn!(error = %e, "Endpoint probe failed");
                false
            }
        }
    }
}
