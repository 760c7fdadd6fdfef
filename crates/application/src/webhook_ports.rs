use async_trait::async_trait;
use rentfold_core::AppResult;
use serde_json::Value;

/// One outbound webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookDispatch {
    /// Absolute http(s) endpoint URL.
    pub url: String,
    /// JSON payload posted to the endpoint.
    pub payload: Value,
    /// Idempotency key derived from execution id and attempt number, so the
    /// receiver can deduplicate retried attempts.
    pub idempotency_key: String,
}

/// Port for outbound webhook delivery.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    /// Posts the payload and fails on transport errors or non-2xx responses.
    async fn dispatch(&self, dispatch: WebhookDispatch) -> AppResult<()>;
}
