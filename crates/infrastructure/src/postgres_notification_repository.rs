use std::str::FromStr;

use async_trait::async_trait;
use rentfold_application::{CreateNotificationInput, Notification, NotificationRepository};
use rentfold_core::{AppError, AppResult};
use rentfold_domain::NotificationSeverity;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed notification repository.
#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// Creates a notification repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: uuid::Uuid,
    recipient_subject: String,
    title: String,
    message: String,
    severity: String,
    created_by: String,
    is_read: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, input: CreateNotificationInput) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (recipient_subject, title, message, severity, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, recipient_subject, title, message, severity, created_by, is_read, created_at
            "#,
        )
        .bind(input.recipient_subject)
        .bind(input.title)
        .bind(input.message)
        .bind(input.severity.as_str())
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create notification: {error}")))?;

        notification_from_row(row)
    }

    async fn list_for_recipient(
        &self,
        recipient_subject: &str,
        limit: u32,
    ) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient_subject, title, message, severity, created_by, is_read, created_at
            FROM notifications
            WHERE recipient_subject = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(recipient_subject)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list notifications for '{recipient_subject}': {error}"
            ))
        })?;

        rows.into_iter().map(notification_from_row).collect()
    }

    async fn find(&self, notification_id: &str) -> AppResult<Option<Notification>> {
        let notification_uuid = uuid::Uuid::parse_str(notification_id).map_err(|error| {
            AppError::Validation(format!(
                "invalid notification id '{notification_id}': {error}"
            ))
        })?;

        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, recipient_subject, title, message, severity, created_by, is_read, created_at
            FROM notifications
            WHERE id = $1
            "#,
        )
        .bind(notification_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find notification '{notification_id}': {error}"
            ))
        })?;

        row.map(notification_from_row).transpose()
    }

    async fn mark_read(&self, notification_id: &str) -> AppResult<()> {
        let notification_uuid = uuid::Uuid::parse_str(notification_id).map_err(|error| {
            AppError::Validation(format!(
                "invalid notification id '{notification_id}': {error}"
            ))
        })?;

        sqlx::query("UPDATE notifications SET is_read = true WHERE id = $1")
            .bind(notification_uuid)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to mark notification '{notification_id}' read: {error}"
                ))
            })?;

        Ok(())
    }
}

fn notification_from_row(row: NotificationRow) -> AppResult<Notification> {
    Ok(Notification {
        notification_id: row.id.to_string(),
        recipient_subject: row.recipient_subject,
        title: row.title,
        message: row.message,
        severity: NotificationSeverity::from_str(row.severity.as_str())?,
        created_by: row.created_by,
        is_read: row.is_read,
        created_at: row.created_at,
    })
}
