//! Workflow engine that runs the closed action set step by step.

use std::sync::Arc;

use async_trait::async_trait;
use rentfold_application::{
    CreateNotificationInput, EmailService, EngineContext, EngineRunResult, NotificationRepository,
    StepOutcome, WebhookDispatch, WebhookDispatcher, WorkflowEngine, SYSTEM_CREATOR,
};
use rentfold_core::AppResult;
use rentfold_domain::{NotificationSeverity, WorkflowAction, WorkflowDefinition};
use tracing::info;

/// Executes workflow actions in definition order, stopping at the first
/// failing action.
pub struct StepWorkflowEngine {
    email_service: Arc<dyn EmailService>,
    notification_repository: Arc<dyn NotificationRepository>,
    webhook_dispatcher: Arc<dyn WebhookDispatcher>,
}

impl StepWorkflowEngine {
    /// Creates a step engine from the action side-effect adapters.
    #[must_use]
    pub fn new(
        email_service: Arc<dyn EmailService>,
        notification_repository: Arc<dyn NotificationRepository>,
        webhook_dispatcher: Arc<dyn WebhookDispatcher>,
    ) -> Self {
        Self {
            email_service,
            notification_repository,
            webhook_dispatcher,
        }
    }

    async fn run_action(
        &self,
        action: &WorkflowAction,
        context: &EngineContext,
    ) -> AppResult<StepOutcome> {
        let detail = match action {
            WorkflowAction::LogMessage { message } => {
                info!(
                    execution_id = %context.execution_id,
                    workflow_id = %context.workflow_id,
                    message,
                    "workflow log action"
                );
                format!("logged '{message}'")
            }
            WorkflowAction::SendEmail { to, subject, body } => {
                self.email_service.send(to, subject, body).await?;
                format!("sent email to '{to}'")
            }
            WorkflowAction::CreateNotification { title, message } => {
                self.notification_repository
                    .create(CreateNotificationInput {
                        recipient_subject: context.triggered_by_subject.clone(),
                        title: title.clone(),
                        message: message.clone(),
                        severity: NotificationSeverity::Success,
                        created_by: SYSTEM_CREATOR.to_owned(),
                    })
                    .await?;
                format!("created notification '{title}'")
            }
            WorkflowAction::InvokeWebhook { url, payload } => {
                self.webhook_dispatcher
                    .dispatch(WebhookDispatch {
                        url: url.clone(),
                        payload: payload.clone(),
                        idempotency_key: format!(
                            "{}-{}",
                            context.execution_id, context.attempt_number
                        ),
                    })
                    .await?;
                format!("invoked webhook '{url}'")
            }
        };

        Ok(StepOutcome {
            action_type: action.action_type().to_owned(),
            detail,
        })
    }
}

#[async_trait]
impl WorkflowEngine for StepWorkflowEngine {
    async fn execute(
        &self,
        workflow: &WorkflowDefinition,
        context: &EngineContext,
    ) -> AppResult<EngineRunResult> {
        let mut steps = Vec::with_capacity(workflow.actions().len());

        for action in workflow.actions() {
            steps.push(self.run_action(action, context).await?);
        }

        Ok(EngineRunResult { steps })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use rentfold_application::{
        CreateNotificationInput, EmailService, EngineContext, Notification,
        NotificationRepository, WebhookDispatch, WebhookDispatcher, WorkflowEngine,
    };
    use rentfold_core::{AppError, AppResult};
    use rentfold_domain::{
        WorkflowAction, WorkflowDefinition, WorkflowDefinitionInput, WorkflowTrigger,
    };
    use tokio::sync::Mutex;

    use super::StepWorkflowEngine;

    #[derive(Default)]
    struct FakeEmailService {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailService for FakeEmailService {
        async fn send(&self, to: &str, subject: &str, _body: &str) -> AppResult<()> {
            if self.fail {
                return Err(AppError::Internal("smtp unavailable".to_owned()));
            }
            self.sent
                .lock()
                .await
                .push((to.to_owned(), subject.to_owned()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeNotificationRepository {
        created: Mutex<Vec<CreateNotificationInput>>,
    }

    #[async_trait]
    impl NotificationRepository for FakeNotificationRepository {
        async fn create(&self, input: CreateNotificationInput) -> AppResult<Notification> {
            let notification = Notification {
                notification_id: "notification-1".to_owned(),
                recipient_subject: input.recipient_subject.clone(),
                title: input.title.clone(),
                message: input.message.clone(),
                severity: input.severity,
                created_by: input.created_by.clone(),
                is_read: false,
                created_at: Utc::now(),
            };
            self.created.lock().await.push(input);
            Ok(notification)
        }

        async fn list_for_recipient(
            &self,
            _recipient_subject: &str,
            _limit: u32,
        ) -> AppResult<Vec<Notification>> {
            Ok(Vec::new())
        }

        async fn find(&self, _notification_id: &str) -> AppResult<Option<Notification>> {
            Ok(None)
        }

        async fn mark_read(&self, _notification_id: &str) -> AppResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeWebhookDispatcher {
        dispatched: Mutex<Vec<WebhookDispatch>>,
    }

    #[async_trait]
    impl WebhookDispatcher for FakeWebhookDispatcher {
        async fn dispatch(&self, dispatch: WebhookDispatch) -> AppResult<()> {
            self.dispatched.lock().await.push(dispatch);
            Ok(())
        }
    }

    fn workflow(actions: Vec<WorkflowAction>) -> WorkflowDefinition {
        WorkflowDefinition::new(WorkflowDefinitionInput {
            name: "Late Rent Reminder".to_owned(),
            description: None,
            trigger: WorkflowTrigger::Manual,
            actions,
            is_enabled: true,
            owner_subject: None,
        })
        .unwrap_or_else(|_| unreachable!())
    }

    fn context() -> EngineContext {
        EngineContext {
            execution_id: "exec-1".to_owned(),
            workflow_id: "wf-1".to_owned(),
            trigger_payload: serde_json::json!({}),
            triggered_by_subject: "staff-1".to_owned(),
            attempt_number: 2,
        }
    }

    #[tokio::test]
    async fn runs_actions_in_order_and_reports_steps() {
        let email_service = Arc::new(FakeEmailService::default());
        let notification_repository = Arc::new(FakeNotificationRepository::default());
        let webhook_dispatcher = Arc::new(FakeWebhookDispatcher::default());
        let engine = StepWorkflowEngine::new(
            email_service.clone(),
            notification_repository.clone(),
            webhook_dispatcher.clone(),
        );

        let workflow = workflow(vec![
            WorkflowAction::LogMessage {
                message: "starting".to_owned(),
            },
            WorkflowAction::SendEmail {
                to: "owner@example.com".to_owned(),
                subject: "Rent due".to_owned(),
                body: "Rent is overdue.".to_owned(),
            },
            WorkflowAction::InvokeWebhook {
                url: "https://hooks.example.com/rent".to_owned(),
                payload: serde_json::json!({"unit": "4B"}),
            },
        ]);

        let result = engine.execute(&workflow, &context()).await;
        assert!(result.is_ok());
        let result = result.unwrap_or_else(|_| unreachable!());
        assert_eq!(result.steps.len(), 3);
        assert_eq!(result.steps[0].action_type, "log_message");

        assert_eq!(email_service.sent.lock().await.len(), 1);

        let dispatched = webhook_dispatcher.dispatched.lock().await;
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].idempotency_key, "exec-1-2");
    }

    #[tokio::test]
    async fn stops_at_first_failing_action() {
        let email_service = Arc::new(FakeEmailService {
            sent: Mutex::new(Vec::new()),
            fail: true,
        });
        let webhook_dispatcher = Arc::new(FakeWebhookDispatcher::default());
        let engine = StepWorkflowEngine::new(
            email_service,
            Arc::new(FakeNotificationRepository::default()),
            webhook_dispatcher.clone(),
        );

        let workflow = workflow(vec![
            WorkflowAction::SendEmail {
                to: "owner@example.com".to_owned(),
                subject: "Rent due".to_owned(),
                body: "Rent is overdue.".to_owned(),
            },
            WorkflowAction::InvokeWebhook {
                url: "https://hooks.example.com/rent".to_owned(),
                payload: serde_json::json!({}),
            },
        ]);

        let result = engine.execute(&workflow, &context()).await;
        assert!(result.is_err());
        assert!(webhook_dispatcher.dispatched.lock().await.is_empty());
    }

    #[tokio::test]
    async fn notification_action_targets_triggering_actor() {
        let notification_repository = Arc::new(FakeNotificationRepository::default());
        let engine = StepWorkflowEngine::new(
            Arc::new(FakeEmailService::default()),
            notification_repository.clone(),
            Arc::new(FakeWebhookDispatcher::default()),
        );

        let workflow = workflow(vec![WorkflowAction::CreateNotification {
            title: "Inspection booked".to_owned(),
            message: "Unit 4B inspection scheduled.".to_owned(),
        }]);

        let result = engine.execute(&workflow, &context()).await;
        assert!(result.is_ok());

        let created = notification_repository.created.lock().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].recipient_subject, "staff-1");
        assert_eq!(created[0].created_by, rentfold_application::SYSTEM_CREATOR);
    }
}
