//! Best-effort operational notifications to a chat webhook.
//!
//! Delivery is retried like any other outbound call, but notifications are
//! advisory: once the retry budget is spent the failure is logged and
//! swallowed so it can never take down the pipeline it reports on.

use serde_json::{Value, json};

use crate::error::RelayError;
use crate::resilience::RetryPolicy;

#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    webhook_url: String,
    policy: RetryPolicy,
}

impl Notifier {
    pub fn new(http: reqwest::Client, webhook_url: String, policy: RetryPolicy) -> Self {
        Self {
            http,
            webhook_url,
            policy,
        }
    }

    /// Posts a plain-text message to the webhook. Never fails the caller.
    pub async fn send(&self, message: &str) {
        if self.webhook_url.is_empty() {
            tracing::debug!(message, "Notification webhook not configured, dropping message");
            return;
        }

        let op = "notify.send";
        let body = json!({ "text": message });
        let body = &body;

        let result = self
            .policy
            .call(op, || self.send_once(op, body))
            .await
            .map_err(RelayError::from);

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to deliver notification");
        }
    }

    async fn send_once(&self, op: &str, body: &Value) -> Result<(), RelayError> {
        let response = self
            .http
            .post(&self.webhook_url)
            .json(body)
            .send()
            .await
            .map_err(|source| RelayError::Transport {
                op: op.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::UpstreamStatus {
                op: op.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
