//! Best-effort notifications
//!
//! Notifications report post results and upcoming slots to an external
//! observer. Delivery is strictly fire-and-forget: a failed notification
//! is logged and discarded, and must never affect pipeline outcome.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Fire-and-forget notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a notification; failures are absorbed by the implementation
    async fn notify(&self, title: &str, message: &str);
}

/// Notifier that discards everything (notifications disabled)
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, title: &str, _message: &str) {
        debug!(title, "Notification suppressed (no notifier configured)");
    }
}

/// JSON body posted to the webhook
#[derive(Debug, Serialize)]
struct WebhookBody<'a> {
    title: &'a str,
    message: &'a str,
}

/// Notifier that POSTs `{title, message}` JSON to a webhook URL
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// Create a webhook notifier
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, title: &str, message: &str) {
        let body = WebhookBody { title, message };

        match self.client.post(&self.url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(title, "Notification delivered");
            }
            Ok(response) => {
                warn!(
                    title,
                    status = response.status().as_u16(),
                    "Notification rejected by webhook"
                );
            }
            Err(e) => {
                warn!(title, error = %e, "Notification delivery failed");
            }
        }
    }
}
