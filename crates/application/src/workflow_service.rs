use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rentfold_core::{AppError, AppResult, Role, UserIdentity};
use rentfold_domain::{NotificationSeverity, WorkflowDefinition, WorkflowDefinitionInput};
use serde_json::Value;

use crate::notification_ports::{CreateNotificationInput, NotificationRepository, SYSTEM_CREATOR};
use crate::workflow_ports::{
    ClaimedExecutionJob, CompleteExecutionInput, CreateExecutionInput, EngineContext,
    ExecutionAttempt, ExecutionAttemptStatus, ExecutionHistoryQuery, ExecutionStatus,
    SaveWorkflowInput, TriggerKind, WorkerHeartbeatInput, WorkflowEngine, WorkflowExecution,
    WorkflowExecutionMode, WorkflowRecord, WorkflowRepository,
};
use crate::AuthorizationService;

mod definitions;
mod dispatch;
mod execution;
mod history;
mod queue;

/// Attempts made before an execution is marked failed.
pub const MAX_EXECUTION_ATTEMPTS: i32 = 3;

/// One page of execution history for a workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionHistoryPage {
    /// Executions on this page, newest first.
    pub executions: Vec<WorkflowExecution>,
    /// 1-based page number after clamping.
    pub page: u32,
    /// Page size after clamping.
    pub limit: u32,
    /// Total executions recorded for the workflow.
    pub total: u64,
}

/// Workflow service for definition management, execution, and history.
#[derive(Clone)]
pub struct WorkflowService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn WorkflowRepository>,
    engine: Arc<dyn WorkflowEngine>,
    notification_repository: Arc<dyn NotificationRepository>,
    execution_mode: WorkflowExecutionMode,
}

impl WorkflowService {
    /// Creates a workflow service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn WorkflowRepository>,
        engine: Arc<dyn WorkflowEngine>,
        notification_repository: Arc<dyn NotificationRepository>,
        execution_mode: WorkflowExecutionMode,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            engine,
            notification_repository,
            execution_mode,
        }
    }

    /// Returns the configured execution mode.
    #[must_use]
    pub fn execution_mode(&self) -> WorkflowExecutionMode {
        self.execution_mode
    }
}

#[cfg(test)]
mod tests;
