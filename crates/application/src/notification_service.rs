use std::sync::Arc;

use rentfold_core::{AppError, AppResult, UserIdentity};

use crate::notification_ports::{Notification, NotificationRepository};

/// Default number of notifications returned by a listing.
const DEFAULT_NOTIFICATION_LIMIT: u32 = 50;
/// Largest notification page a caller may request.
const MAX_NOTIFICATION_LIMIT: u32 = 100;

/// Application service for the in-app notification inbox.
#[derive(Clone)]
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    /// Creates a notification service.
    #[must_use]
    pub fn new(repository: Arc<dyn NotificationRepository>) -> Self {
        Self { repository }
    }

    /// Lists the actor's notifications, newest first.
    ///
    /// `limit` is clamped to 1..=100 and defaults to 50.
    pub async fn list_for_actor(
        &self,
        actor: &UserIdentity,
        limit: Option<u32>,
    ) -> AppResult<Vec<Notification>> {
        let limit = limit
            .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
            .clamp(1, MAX_NOTIFICATION_LIMIT);

        self.repository
            .list_for_recipient(actor.subject(), limit)
            .await
    }

    /// Marks one of the actor's notifications read.
    ///
    /// A notification addressed to another recipient surfaces as NotFound,
    /// so ids cannot be probed across recipients.
    pub async fn mark_read(&self, actor: &UserIdentity, notification_id: &str) -> AppResult<()> {
        let notification = self
            .repository
            .find(notification_id)
            .await?
            .ok_or_else(|| not_found(notification_id))?;

        if notification.recipient_subject != actor.subject() {
            return Err(not_found(notification_id));
        }

        self.repository.mark_read(notification_id).await
    }
}

fn not_found(notification_id: &str) -> AppError {
    AppError::NotFound(format!("notification '{notification_id}' not found"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use rentfold_core::{AppError, AppResult, Role, UserIdentity};
    use rentfold_domain::NotificationSeverity;
    use tokio::sync::Mutex;

    use crate::notification_ports::{
        CreateNotificationInput, Notification, NotificationRepository, SYSTEM_CREATOR,
    };

    use super::NotificationService;

    #[derive(Default)]
    struct FakeNotificationRepository {
        notifications: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationRepository for FakeNotificationRepository {
        async fn create(&self, input: CreateNotificationInput) -> AppResult<Notification> {
            let mut notifications = self.notifications.lock().await;
            let notification = Notification {
                notification_id: format!("notification-{}", notifications.len() + 1),
                recipient_subject: input.recipient_subject,
                title: input.title,
                message: input.message,
                severity: input.severity,
                created_by: input.created_by,
                is_read: false,
                created_at: Utc::now(),
            };
            notifications.push(notification.clone());
            Ok(notification)
        }

        async fn list_for_recipient(
            &self,
            recipient_subject: &str,
            limit: u32,
        ) -> AppResult<Vec<Notification>> {
            Ok(self
                .notifications
                .lock()
                .await
                .iter()
                .filter(|notification| notification.recipient_subject == recipient_subject)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn find(&self, notification_id: &str) -> AppResult<Option<Notification>> {
            Ok(self
                .notifications
                .lock()
                .await
                .iter()
                .find(|notification| notification.notification_id == notification_id)
                .cloned())
        }

        async fn mark_read(&self, notification_id: &str) -> AppResult<()> {
            let mut notifications = self.notifications.lock().await;
            for notification in notifications.iter_mut() {
                if notification.notification_id == notification_id {
                    notification.is_read = true;
                }
            }
            Ok(())
        }
    }

    fn actor(subject: &str) -> UserIdentity {
        UserIdentity::new(
            subject.to_owned(),
            "Test User".to_owned(),
            None,
            Role::Staff,
        )
    }

    async fn seeded_service(recipient: &str) -> (NotificationService, Arc<FakeNotificationRepository>)
    {
        let repository = Arc::new(FakeNotificationRepository::default());
        let created = repository
            .create(CreateNotificationInput {
                recipient_subject: recipient.to_owned(),
                title: "Workflow completed".to_owned(),
                message: "Workflow 'Late Rent Reminder' completed after 1 attempt(s)".to_owned(),
                severity: NotificationSeverity::Success,
                created_by: SYSTEM_CREATOR.to_owned(),
            })
            .await;
        assert!(created.is_ok());

        (NotificationService::new(repository.clone()), repository)
    }

    #[tokio::test]
    async fn list_only_returns_own_notifications() {
        let (service, _repository) = seeded_service("staff-1").await;

        let own = service.list_for_actor(&actor("staff-1"), None).await;
        assert_eq!(own.map(|list| list.len()).ok(), Some(1));

        let other = service.list_for_actor(&actor("staff-2"), None).await;
        assert_eq!(other.map(|list| list.len()).ok(), Some(0));
    }

    #[tokio::test]
    async fn list_honors_requested_limit() {
        let (service, repository) = seeded_service("staff-1").await;
        for index in 0..2 {
            let created = repository
                .create(CreateNotificationInput {
                    recipient_subject: "staff-1".to_owned(),
                    title: format!("Notification {index}"),
                    message: "Extra".to_owned(),
                    severity: NotificationSeverity::Success,
                    created_by: SYSTEM_CREATOR.to_owned(),
                })
                .await;
            assert!(created.is_ok());
        }

        let limited = service.list_for_actor(&actor("staff-1"), Some(2)).await;
        assert_eq!(limited.map(|list| list.len()).ok(), Some(2));

        // A zero limit clamps up to one result instead of returning nothing.
        let clamped = service.list_for_actor(&actor("staff-1"), Some(0)).await;
        assert_eq!(clamped.map(|list| list.len()).ok(), Some(1));
    }

    #[tokio::test]
    async fn mark_read_updates_own_notification() {
        let (service, repository) = seeded_service("staff-1").await;

        let result = service.mark_read(&actor("staff-1"), "notification-1").await;
        assert!(result.is_ok());

        let notifications = repository.notifications.lock().await;
        assert!(notifications[0].is_read);
    }

    #[tokio::test]
    async fn mark_read_hides_foreign_notification_as_not_found() {
        let (service, _repository) = seeded_service("staff-1").await;

        let result = service.mark_read(&actor("staff-2"), "notification-1").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
