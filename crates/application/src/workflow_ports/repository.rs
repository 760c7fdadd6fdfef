use async_trait::async_trait;
use rentfold_core::AppResult;

use super::execution::{
    ClaimedExecutionJob, CompleteExecutionInput, CreateExecutionInput, ExecutionAttempt,
    ExecutionHistoryQuery, SaveWorkflowInput, WorkerHeartbeatInput, WorkflowExecution,
    WorkflowRecord,
};

/// Port for workflow definition, execution, and queue persistence.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Persists a new workflow definition and returns the stored record.
    async fn create_workflow(
        &self,
        input: SaveWorkflowInput,
        created_by: &str,
    ) -> AppResult<WorkflowRecord>;

    /// Returns one workflow by id, or `None` when absent.
    async fn find_workflow(&self, workflow_id: &str) -> AppResult<Option<WorkflowRecord>>;

    /// Lists workflows, newest first.
    async fn list_workflows(&self) -> AppResult<Vec<WorkflowRecord>>;

    /// Lists enabled workflows with an event trigger matching `event_name`.
    async fn list_event_workflows(&self, event_name: &str) -> AppResult<Vec<WorkflowRecord>>;

    /// Creates a `running` execution intent record.
    ///
    /// Returns `AppError::Conflict` when an execution for the same workflow
    /// is already running. A running execution older than
    /// [`STALE_RUNNING_EXECUTION_SECONDS`](super::STALE_RUNNING_EXECUTION_SECONDS)
    /// counts as abandoned and is failed instead of blocking the new intent.
    async fn create_execution(&self, input: CreateExecutionInput) -> AppResult<WorkflowExecution>;

    /// Moves an execution to its terminal state.
    async fn complete_execution(
        &self,
        input: CompleteExecutionInput,
    ) -> AppResult<WorkflowExecution>;

    /// Appends one attempt audit row.
    async fn append_attempt(&self, attempt: ExecutionAttempt) -> AppResult<()>;

    /// Returns the execution history page for one workflow, newest first.
    async fn list_executions(
        &self,
        workflow_id: &str,
        query: ExecutionHistoryQuery,
    ) -> AppResult<Vec<WorkflowExecution>>;

    /// Counts all executions recorded for one workflow.
    async fn count_executions(&self, workflow_id: &str) -> AppResult<u64>;

    /// Returns one execution by id, or `None` when absent.
    async fn find_execution(&self, execution_id: &str) -> AppResult<Option<WorkflowExecution>>;

    /// Lists attempt rows for one execution in attempt order.
    async fn list_attempts(&self, execution_id: &str) -> AppResult<Vec<ExecutionAttempt>>;

    /// Enqueues a queued-mode execution job.
    async fn enqueue_execution_job(&self, execution_id: &str) -> AppResult<()>;

    /// Claims up to `batch_size` pending jobs for `worker_id`.
    ///
    /// Jobs whose previous claim is older than `lease_seconds` count as
    /// pending again; reclaiming issues a fresh lease token that fences out
    /// the previous holder.
    async fn claim_execution_jobs(
        &self,
        worker_id: &str,
        batch_size: u32,
        lease_seconds: u32,
    ) -> AppResult<Vec<ClaimedExecutionJob>>;

    /// Marks a claimed job done. The lease token must still match, otherwise
    /// the completion is ignored.
    async fn complete_execution_job(&self, job_id: &str, lease_token: &str) -> AppResult<()>;

    /// Returns a failed claimed job to the queue for another claim.
    async fn release_execution_job(&self, job_id: &str, lease_token: &str) -> AppResult<()>;

    /// Upserts the heartbeat row for one worker.
    async fn upsert_worker_heartbeat(
        &self,
        worker_id: &str,
        input: WorkerHeartbeatInput,
    ) -> AppResult<()>;
}
