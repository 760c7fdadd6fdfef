use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rentfold_core::AppResult;
use rentfold_domain::NotificationSeverity;

/// Creator tag for notifications produced by automation rather than a user.
pub const SYSTEM_CREATOR: &str = "system";

/// Persisted in-app notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Stable notification identifier.
    pub notification_id: String,
    /// Subject the notification addresses.
    pub recipient_subject: String,
    /// Notification title.
    pub title: String,
    /// Notification message body.
    pub message: String,
    /// Severity tag.
    pub severity: NotificationSeverity,
    /// Creating subject, or [`SYSTEM_CREATOR`] for automated notifications.
    pub created_by: String,
    /// Whether the recipient has read the notification.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Notification creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateNotificationInput {
    /// Subject the notification addresses.
    pub recipient_subject: String,
    /// Notification title.
    pub title: String,
    /// Notification message body.
    pub message: String,
    /// Severity tag.
    pub severity: NotificationSeverity,
    /// Creating subject, or [`SYSTEM_CREATOR`] for automated notifications.
    pub created_by: String,
}

/// Port for in-app notification persistence.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persists one notification and returns the stored row.
    async fn create(&self, input: CreateNotificationInput) -> AppResult<Notification>;

    /// Lists up to `limit` notifications for one recipient, newest first.
    async fn list_for_recipient(
        &self,
        recipient_subject: &str,
        limit: u32,
    ) -> AppResult<Vec<Notification>>;

    /// Returns one notification by id, or `None` when absent.
    async fn find(&self, notification_id: &str) -> AppResult<Option<Notification>>;

    /// Marks one notification read.
    async fn mark_read(&self, notification_id: &str) -> AppResult<()>;
}
