use rentfold_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Workflow trigger source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowTrigger {
    /// Manually invoked trigger.
    Manual,
    /// Named platform event trigger (e.g. `maintenance_request.created`).
    Event {
        /// Event name that starts the workflow.
        event_name: String,
    },
    /// Cron-scheduled trigger.
    Schedule {
        /// Five-field cron expression.
        cron_expression: String,
    },
}

impl WorkflowTrigger {
    /// Returns stable trigger type value.
    #[must_use]
    pub fn trigger_type(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Event { .. } => "event",
            Self::Schedule { .. } => "schedule",
        }
    }

    /// Returns the event name for event triggers.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Self::Event { event_name } => Some(event_name.as_str()),
            Self::Manual | Self::Schedule { .. } => None,
        }
    }
}

/// One workflow action from the closed action set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowAction {
    /// Records an informational message in the step outcome.
    LogMessage {
        /// Message captured as action output.
        message: String,
    },
    /// Sends an email through the configured email provider.
    SendEmail {
        /// Recipient address.
        to: String,
        /// Email subject line.
        subject: String,
        /// Plain-text email body.
        body: String,
    },
    /// Creates an in-app notification for the triggering actor.
    CreateNotification {
        /// Notification title.
        title: String,
        /// Notification message body.
        message: String,
    },
    /// Posts a JSON payload to an external endpoint.
    InvokeWebhook {
        /// Absolute http(s) endpoint URL.
        url: String,
        /// JSON object payload delivered to the endpoint.
        payload: Value,
    },
}

impl WorkflowAction {
    /// Returns stable action type value.
    #[must_use]
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::LogMessage { .. } => "log_message",
            Self::SendEmail { .. } => "send_email",
            Self::CreateNotification { .. } => "create_notification",
            Self::InvokeWebhook { .. } => "invoke_webhook",
        }
    }
}

/// Validated workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    name: NonEmptyString,
    description: Option<String>,
    trigger: WorkflowTrigger,
    actions: Vec<WorkflowAction>,
    is_enabled: bool,
    owner_subject: Option<String>,
}

/// Input payload used to construct a validated workflow definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinitionInput {
    /// User-facing workflow name.
    pub name: String,
    /// Optional workflow description.
    pub description: Option<String>,
    /// Trigger configuration.
    pub trigger: WorkflowTrigger,
    /// Ordered action list.
    pub actions: Vec<WorkflowAction>,
    /// Enabled/disabled flag.
    pub is_enabled: bool,
    /// Optional owning subject for owner-scoped visibility.
    pub owner_subject: Option<String>,
}

impl WorkflowDefinition {
    /// Creates a validated workflow definition.
    pub fn new(input: WorkflowDefinitionInput) -> AppResult<Self> {
        let WorkflowDefinitionInput {
            name,
            description,
            trigger,
            actions,
            is_enabled,
            owner_subject,
        } = input;

        validate_trigger(&trigger)?;

        if actions.is_empty() {
            return Err(AppError::Validation(
                "workflow must include at least one action".to_owned(),
            ));
        }

        for action in &actions {
            validate_action(action)?;
        }

        let description = description.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        let owner_subject = owner_subject.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            name: NonEmptyString::new(name)?,
            description,
            trigger,
            actions,
            is_enabled,
            owner_subject,
        })
    }

    /// Returns workflow name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns optional workflow description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns workflow trigger configuration.
    #[must_use]
    pub fn trigger(&self) -> &WorkflowTrigger {
        &self.trigger
    }

    /// Returns the ordered action list.
    #[must_use]
    pub fn actions(&self) -> &[WorkflowAction] {
        self.actions.as_slice()
    }

    /// Returns whether the workflow is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Returns the owning subject, when the workflow is owner-scoped.
    #[must_use]
    pub fn owner_subject(&self) -> Option<&str> {
        self.owner_subject.as_deref()
    }
}

fn validate_trigger(trigger: &WorkflowTrigger) -> AppResult<()> {
    match trigger {
        WorkflowTrigger::Manual => Ok(()),
        WorkflowTrigger::Event { event_name } => {
            if event_name.trim().is_empty() {
                return Err(AppError::Validation(
                    "event trigger requires a non-empty event_name".to_owned(),
                ));
            }

            Ok(())
        }
        WorkflowTrigger::Schedule { cron_expression } => {
            let field_count = cron_expression.split_whitespace().count();
            if field_count != 5 {
                return Err(AppError::Validation(format!(
                    "schedule trigger cron_expression must have 5 fields, got {field_count}"
                )));
            }

            Ok(())
        }
    }
}

fn validate_action(action: &WorkflowAction) -> AppResult<()> {
    match action {
        WorkflowAction::LogMessage { message } => {
            if message.trim().is_empty() {
                return Err(AppError::Validation(
                    "log_message action requires a non-empty message".to_owned(),
                ));
            }

            Ok(())
        }
        WorkflowAction::SendEmail { to, subject, body } => {
            if to.trim().is_empty() || !to.contains('@') {
                return Err(AppError::Validation(
                    "send_email action requires a valid recipient address".to_owned(),
                ));
            }

            if subject.trim().is_empty() {
                return Err(AppError::Validation(
                    "send_email action requires a non-empty subject".to_owned(),
                ));
            }

            if body.trim().is_empty() {
                return Err(AppError::Validation(
                    "send_email action requires a non-empty body".to_owned(),
                ));
            }

            Ok(())
        }
        WorkflowAction::CreateNotification { title, message } => {
            if title.trim().is_empty() {
                return Err(AppError::Validation(
                    "create_notification action requires a non-empty title".to_owned(),
                ));
            }

            if message.trim().is_empty() {
                return Err(AppError::Validation(
                    "create_notification action requires a non-empty message".to_owned(),
                ));
            }

            Ok(())
        }
        WorkflowAction::InvokeWebhook { url, payload } => {
            let parsed = url::Url::parse(url).map_err(|error| {
                AppError::Validation(format!("invoke_webhook action has invalid url: {error}"))
            })?;

            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(AppError::Validation(format!(
                    "invoke_webhook action url must use http or https, got '{}'",
                    parsed.scheme()
                )));
            }

            if !payload.is_object() {
                return Err(AppError::Validation(
                    "invoke_webhook action payload must be a JSON object".to_owned(),
                ));
            }

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{WorkflowAction, WorkflowDefinition, WorkflowDefinitionInput, WorkflowTrigger};

    fn base_input() -> WorkflowDefinitionInput {
        WorkflowDefinitionInput {
            name: "Late Rent Reminder".to_owned(),
            description: None,
            trigger: WorkflowTrigger::Manual,
            actions: vec![WorkflowAction::LogMessage {
                message: "reminder queued".to_owned(),
            }],
            is_enabled: true,
            owner_subject: None,
        }
    }

    #[test]
    fn workflow_requires_at_least_one_action() {
        let mut input = base_input();
        input.actions = Vec::new();

        assert!(WorkflowDefinition::new(input).is_err());
    }

    #[test]
    fn schedule_trigger_requires_five_cron_fields() {
        let mut input = base_input();
        input.trigger = WorkflowTrigger::Schedule {
            cron_expression: "0 9 * *".to_owned(),
        };

        assert!(WorkflowDefinition::new(input).is_err());
    }

    #[test]
    fn event_trigger_requires_event_name() {
        let mut input = base_input();
        input.trigger = WorkflowTrigger::Event {
            event_name: "  ".to_owned(),
        };

        assert!(WorkflowDefinition::new(input).is_err());
    }

    #[test]
    fn send_email_action_rejects_invalid_recipient() {
        let mut input = base_input();
        input.actions = vec![WorkflowAction::SendEmail {
            to: "not-an-address".to_owned(),
            subject: "Rent due".to_owned(),
            body: "Your rent is overdue.".to_owned(),
        }];

        assert!(WorkflowDefinition::new(input).is_err());
    }

    #[test]
    fn invoke_webhook_action_rejects_non_http_url() {
        let mut input = base_input();
        input.actions = vec![WorkflowAction::InvokeWebhook {
            url: "ftp://example.com/hook".to_owned(),
            payload: serde_json::json!({}),
        }];

        assert!(WorkflowDefinition::new(input).is_err());
    }

    #[test]
    fn invoke_webhook_action_requires_object_payload() {
        let mut input = base_input();
        input.actions = vec![WorkflowAction::InvokeWebhook {
            url: "https://hooks.example.com/rent".to_owned(),
            payload: serde_json::json!("invalid"),
        }];

        assert!(WorkflowDefinition::new(input).is_err());
    }

    #[test]
    fn workflow_accepts_full_action_list() {
        let mut input = base_input();
        input.description = Some("  Nightly owner digest  ".to_owned());
        input.trigger = WorkflowTrigger::Schedule {
            cron_expression: "0 9 * * 1".to_owned(),
        };
        input.actions = vec![
            WorkflowAction::SendEmail {
                to: "owner@example.com".to_owned(),
                subject: "Weekly digest".to_owned(),
                body: "Occupancy summary attached.".to_owned(),
            },
            WorkflowAction::CreateNotification {
                title: "Digest sent".to_owned(),
                message: "The weekly owner digest went out.".to_owned(),
            },
            WorkflowAction::InvokeWebhook {
                url: "https://hooks.example.com/digest".to_owned(),
                payload: serde_json::json!({"week": 34}),
            },
        ];

        let workflow = WorkflowDefinition::new(input);
        assert!(workflow.is_ok());
        let workflow = workflow.unwrap_or_else(|_| unreachable!());
        assert_eq!(workflow.description(), Some("Nightly owner digest"));
        assert_eq!(workflow.actions().len(), 3);
        assert_eq!(workflow.trigger().trigger_type(), "schedule");
    }
}
