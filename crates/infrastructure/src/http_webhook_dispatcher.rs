//! HTTP webhook dispatcher backed by `reqwest`.

use async_trait::async_trait;
use rentfold_application::{WebhookDispatch, WebhookDispatcher};
use rentfold_core::{AppError, AppResult};

/// Posts workflow webhook payloads to external endpoints.
///
/// Delivery is single-shot: retrying a failed delivery is the execution
/// orchestrator's job, and the idempotency key lets receivers deduplicate
/// those retried attempts.
#[derive(Clone)]
pub struct HttpWebhookDispatcher {
    http_client: reqwest::Client,
}

impl HttpWebhookDispatcher {
    /// Creates a webhook dispatcher using the provided HTTP client.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl WebhookDispatcher for HttpWebhookDispatcher {
    async fn dispatch(&self, dispatch: WebhookDispatch) -> AppResult<()> {
        let response = self
            .http_client
            .post(dispatch.url.as_str())
            .header("Idempotency-Key", dispatch.idempotency_key.as_str())
            .json(&dispatch.payload)
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "webhook dispatch to '{}' failed: {error}",
                    dispatch.url
                ))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<response body unavailable>".to_owned());
        Err(AppError::Internal(format!(
            "webhook dispatch to '{}' returned status {status}: {body}",
            dispatch.url
        )))
    }
}
