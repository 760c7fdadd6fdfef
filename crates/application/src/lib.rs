//! Application services and ports for Rentfold workflow automation.

#![forbid(unsafe_code)]

mod authorization_service;
mod email_ports;
mod notification_ports;
mod notification_service;
mod user_ports;
mod user_service;
mod webhook_ports;
mod workflow_ports;
mod workflow_service;

pub use authorization_service::AuthorizationService;
pub use email_ports::EmailService;
pub use notification_ports::{
    CreateNotificationInput, Notification, NotificationRepository, SYSTEM_CREATOR,
};
pub use notification_service::NotificationService;
pub use user_ports::{NewUserAccount, PasswordHasher, UserAccount, UserRepository};
pub use user_service::UserService;
pub use webhook_ports::{WebhookDispatch, WebhookDispatcher};
pub use workflow_ports::{
    ClaimedExecutionJob, CompleteExecutionInput, CreateExecutionInput, EngineContext,
    EngineRunResult, ExecutionAttempt, ExecutionAttemptStatus, ExecutionHistoryQuery,
    ExecutionStatus, SaveWorkflowInput, StepOutcome, TriggerKind, WorkerHeartbeatInput,
    WorkflowEngine, WorkflowExecution, WorkflowExecutionMode, WorkflowRecord, WorkflowRepository,
    STALE_RUNNING_EXECUTION_SECONDS,
};
pub use workflow_service::{ExecutionHistoryPage, WorkflowService, MAX_EXECUTION_ATTEMPTS};
