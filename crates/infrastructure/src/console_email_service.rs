//! Development email service that logs instead of delivering.

use async_trait::async_trait;
use rentfold_application::EmailService;
use rentfold_core::AppResult;
use tracing::info;

/// Email service that writes each message to the log stream.
///
/// Used in local development and tests where no relay is configured; the
/// full body lands in the structured log fields.
#[derive(Clone, Copy, Default)]
pub struct ConsoleEmailService;

impl ConsoleEmailService {
    /// Creates a console email service.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailService for ConsoleEmailService {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        info!(to, subject, body, "email delivered to console transport");
        Ok(())
    }
}
