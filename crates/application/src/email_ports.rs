use async_trait::async_trait;
use rentfold_core::AppResult;

/// Port for outbound email delivery.
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Sends one plain-text email.
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;
}
