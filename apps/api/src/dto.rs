use chrono::{DateTime, Utc};
use rentfold_application::{
    ExecutionAttempt, ExecutionHistoryPage, Notification, SaveWorkflowInput, WorkflowExecution,
    WorkflowRecord,
};
use rentfold_core::UserIdentity;
use rentfold_domain::{WorkflowAction, WorkflowTrigger};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Health probe payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Authenticated identity as exposed to the frontend.
#[derive(Debug, Serialize)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    pub role: String,
}

impl UserIdentityResponse {
    pub fn from_identity(identity: &UserIdentity) -> Self {
        Self {
            subject: identity.subject().to_owned(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(str::to_owned),
            role: identity.role().as_str().to_owned(),
        }
    }
}

/// Incoming payload for first-admin bootstrap.
#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub token: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
}

/// Incoming payload for password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Incoming payload for workflow creation.
#[derive(Debug, Deserialize)]
pub struct SaveWorkflowRequest {
    pub name: String,
    pub description: Option<String>,
    pub trigger: WorkflowTrigger,
    pub actions: Vec<WorkflowAction>,
    pub is_enabled: Option<bool>,
    pub owner_subject: Option<String>,
}

impl SaveWorkflowRequest {
    pub fn into_input(self) -> SaveWorkflowInput {
        SaveWorkflowInput {
            name: self.name,
            description: self.description,
            trigger: self.trigger,
            actions: self.actions,
            is_enabled: self.is_enabled.unwrap_or(true),
            owner_subject: self.owner_subject,
        }
    }
}

/// Stored workflow definition as exposed over the API.
#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub workflow_id: String,
    pub name: String,
    pub description: Option<String>,
    pub trigger: WorkflowTrigger,
    pub actions: Vec<WorkflowAction>,
    pub is_enabled: bool,
    pub owner_subject: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl WorkflowResponse {
    pub fn from_record(record: WorkflowRecord) -> Self {
        Self {
            workflow_id: record.workflow_id,
            name: record.definition.name().as_str().to_owned(),
            description: record.definition.description().map(str::to_owned),
            trigger: record.definition.trigger().clone(),
            actions: record.definition.actions().to_vec(),
            is_enabled: record.definition.is_enabled(),
            owner_subject: record.definition.owner_subject().map(str::to_owned),
            created_by: record.created_by,
            created_at: record.created_at,
        }
    }
}

/// Incoming payload for manual workflow execution.
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteWorkflowRequest {
    pub trigger_payload: Option<Value>,
}

/// Incoming payload for event dispatch.
#[derive(Debug, Deserialize)]
pub struct DispatchEventRequest {
    pub event_name: String,
    pub event_payload: Option<Value>,
}

/// Number of workflow executions started by an event dispatch.
#[derive(Debug, Serialize)]
pub struct DispatchEventResponse {
    pub dispatched: u64,
}

/// One workflow execution record.
#[derive(Debug, Serialize)]
pub struct ExecutionResponse {
    pub execution_id: String,
    pub workflow_id: String,
    pub trigger_kind: String,
    pub trigger_payload: Value,
    pub status: String,
    pub retry_count: i32,
    pub retry_reason: Option<String>,
    pub result: Option<Value>,
    pub duration_ms: Option<i64>,
    pub triggered_by_subject: String,
    pub triggered_by_display_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionResponse {
    pub fn from_execution(execution: WorkflowExecution) -> Self {
        Self {
            execution_id: execution.execution_id,
            workflow_id: execution.workflow_id,
            trigger_kind: execution.trigger_kind.as_str().to_owned(),
            trigger_payload: execution.trigger_payload,
            status: execution.status.as_str().to_owned(),
            retry_count: execution.retry_count,
            retry_reason: execution.retry_reason,
            result: execution.result,
            duration_ms: execution.duration_ms,
            triggered_by_subject: execution.triggered_by_subject,
            triggered_by_display_name: execution.triggered_by_display_name,
            started_at: execution.started_at,
            finished_at: execution.finished_at,
        }
    }
}

/// Pagination query for execution history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// One page of execution history, newest first.
#[derive(Debug, Serialize)]
pub struct ExecutionHistoryResponse {
    pub executions: Vec<ExecutionResponse>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl ExecutionHistoryResponse {
    pub fn from_page(page: ExecutionHistoryPage) -> Self {
        Self {
            executions: page
                .executions
                .into_iter()
                .map(ExecutionResponse::from_execution)
                .collect(),
            page: page.page,
            limit: page.limit,
            total: page.total,
        }
    }
}

/// One attempt row from an execution's audit trail.
#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub execution_id: String,
    pub attempt_number: i32,
    pub status: String,
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub executed_at: DateTime<Utc>,
}

impl AttemptResponse {
    pub fn from_attempt(attempt: ExecutionAttempt) -> Self {
        Self {
            execution_id: attempt.execution_id,
            attempt_number: attempt.attempt_number,
            status: attempt.status.as_str().to_owned(),
            error_message: attempt.error_message,
            duration_ms: attempt.duration_ms,
            executed_at: attempt.executed_at,
        }
    }
}

/// Listing query for the notification inbox.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<u32>,
}

/// One in-app notification.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub notification_id: String,
    pub title: String,
    pub message: String,
    pub severity: String,
    pub created_by: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationResponse {
    pub fn from_notification(notification: Notification) -> Self {
        Self {
            notification_id: notification.notification_id,
            title: notification.title,
            message: notification.message,
            severity: notification.severity.as_str().to_owned(),
            created_by: notification.created_by,
            is_read: notification.is_read,
            created_at: notification.created_at,
        }
    }
}
