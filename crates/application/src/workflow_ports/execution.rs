use chrono::{DateTime, Utc};
use rentfold_core::{AppError, AppResult};
use rentfold_domain::{WorkflowAction, WorkflowDefinition, WorkflowTrigger};
use serde_json::Value;

/// Workflow execution mode used by application services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowExecutionMode {
    /// Execute workflows inside the API request flow.
    Inline,
    /// Queue executions and run them from worker runtimes.
    Queued,
}

/// Age in seconds after which a `running` execution counts as abandoned and
/// may be failed by the next execution request for the same workflow.
///
/// A crash mid-run or a failed terminal write leaves a `running` row that
/// would otherwise hold the one-running-execution guard forever.
pub const STALE_RUNNING_EXECUTION_SECONDS: u32 = 900;

/// Workflow creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveWorkflowInput {
    /// Workflow name.
    pub name: String,
    /// Optional workflow description.
    pub description: Option<String>,
    /// Trigger configuration.
    pub trigger: WorkflowTrigger,
    /// Ordered action list.
    pub actions: Vec<WorkflowAction>,
    /// Whether the workflow is enabled.
    pub is_enabled: bool,
    /// Optional owning subject for owner-scoped visibility.
    pub owner_subject: Option<String>,
}

/// Persisted workflow definition with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRecord {
    /// Stable workflow identifier.
    pub workflow_id: String,
    /// Validated definition payload.
    pub definition: WorkflowDefinition,
    /// Subject that created the workflow.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Reason an execution was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Started by an explicit user request.
    Manual,
    /// Started by a matching platform event.
    Event,
    /// Started by the schedule dispatcher.
    Schedule,
}

impl TriggerKind {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Event => "event",
            Self::Schedule => "schedule",
        }
    }

    /// Parses storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "manual" => Ok(Self::Manual),
            "event" => Ok(Self::Event),
            "schedule" => Ok(Self::Schedule),
            _ => Err(AppError::Validation(format!(
                "unknown trigger kind '{value}'"
            ))),
        }
    }
}

/// Status of one workflow execution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Intent record created; attempts are in flight (or queued).
    Running,
    /// Terminal success, possibly after retries.
    Completed,
    /// Terminal failure after retry exhaustion.
    Failed,
}

impl ExecutionStatus {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown execution status '{value}'"
            ))),
        }
    }
}

/// Attempt-level status inside one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionAttemptStatus {
    /// Attempt succeeded.
    Succeeded,
    /// Attempt failed.
    Failed,
}

impl ExecutionAttemptStatus {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Parses storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown execution attempt status '{value}'"
            ))),
        }
    }
}

/// Persisted workflow execution record.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowExecution {
    /// Stable execution identifier.
    pub execution_id: String,
    /// Workflow the execution belongs to.
    pub workflow_id: String,
    /// Reason the execution was started.
    pub trigger_kind: TriggerKind,
    /// Trigger payload captured for the audit trail.
    pub trigger_payload: Value,
    /// Execution status.
    pub status: ExecutionStatus,
    /// Failed attempts before the terminal outcome.
    pub retry_count: i32,
    /// Error message from the last failed attempt, when any attempt failed.
    pub retry_reason: Option<String>,
    /// Engine result payload for completed executions.
    pub result: Option<Value>,
    /// Duration of the successful attempt in milliseconds.
    pub duration_ms: Option<i64>,
    /// Subject of the triggering actor.
    pub triggered_by_subject: String,
    /// Display name of the triggering actor, captured at trigger time.
    pub triggered_by_display_name: String,
    /// Execution start timestamp.
    pub started_at: DateTime<Utc>,
    /// Execution finish timestamp when terminal.
    pub finished_at: Option<DateTime<Utc>>,
}

/// Persisted per-attempt audit row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionAttempt {
    /// Execution identifier.
    pub execution_id: String,
    /// 1-based attempt sequence.
    pub attempt_number: i32,
    /// Attempt result status.
    pub status: ExecutionAttemptStatus,
    /// Optional failure details.
    pub error_message: Option<String>,
    /// Attempt duration in milliseconds.
    pub duration_ms: i64,
    /// Attempt execution timestamp.
    pub executed_at: DateTime<Utc>,
}

/// Execution creation payload for repository implementations.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateExecutionInput {
    /// Workflow identifier.
    pub workflow_id: String,
    /// Reason the execution was started.
    pub trigger_kind: TriggerKind,
    /// Trigger payload.
    pub trigger_payload: Value,
    /// Subject of the triggering actor.
    pub triggered_by_subject: String,
    /// Display name of the triggering actor.
    pub triggered_by_display_name: String,
}

/// Execution completion payload for repository implementations.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteExecutionInput {
    /// Execution identifier.
    pub execution_id: String,
    /// Terminal status.
    pub status: ExecutionStatus,
    /// Failed attempts before the terminal outcome.
    pub retry_count: i32,
    /// Error message from the last failed attempt.
    pub retry_reason: Option<String>,
    /// Engine result payload for completed executions.
    pub result: Option<Value>,
    /// Duration of the successful attempt in milliseconds.
    pub duration_ms: Option<i64>,
}

/// Clamped pagination for execution history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionHistoryQuery {
    page: u32,
    limit: u32,
}

impl ExecutionHistoryQuery {
    /// Default page size when the caller provides none.
    pub const DEFAULT_LIMIT: u32 = 20;
    /// Largest admissible page size.
    pub const MAX_LIMIT: u32 = 50;

    /// Creates a query with page clamped to >= 1 and limit to 1..=50.
    #[must_use]
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the row offset for the query.
    #[must_use]
    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Claimed queued execution job returned to one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedExecutionJob {
    /// Job identifier.
    pub job_id: String,
    /// Associated execution identifier.
    pub execution_id: String,
    /// Workflow identifier.
    pub workflow_id: String,
    /// Workflow definition snapshot used for execution.
    pub workflow: WorkflowDefinition,
    /// Trigger payload captured when the execution was created.
    pub trigger_payload: Value,
    /// Subject of the triggering actor.
    pub triggered_by_subject: String,
    /// Display name of the triggering actor.
    pub triggered_by_display_name: String,
    /// Lease token used for fencing-token completion checks.
    pub lease_token: String,
}

/// Worker heartbeat payload persisted for queue observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerHeartbeatInput {
    /// Jobs claimed in the latest worker cycle.
    pub claimed_jobs: u32,
    /// Jobs executed to a terminal state in the latest worker cycle.
    pub executed_jobs: u32,
    /// Jobs whose execution errored in the latest worker cycle.
    pub failed_jobs: u32,
}

#[cfg(test)]
mod tests {
    use super::ExecutionHistoryQuery;

    #[test]
    fn history_query_clamps_page_and_limit() {
        let query = ExecutionHistoryQuery::new(Some(0), Some(500));
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 50);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn history_query_defaults_when_unspecified() {
        let query = ExecutionHistoryQuery::new(None, None);
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), ExecutionHistoryQuery::DEFAULT_LIMIT);
    }

    #[test]
    fn history_query_computes_offset_from_page() {
        let query = ExecutionHistoryQuery::new(Some(3), Some(10));
        assert_eq!(query.offset(), 20);
    }
}
