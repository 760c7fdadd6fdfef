mod engine;
mod execution;
mod repository;

pub use engine::{EngineContext, EngineRunResult, StepOutcome, WorkflowEngine};
pub use execution::{
    ClaimedExecutionJob, CompleteExecutionInput, CreateExecutionInput, ExecutionAttempt,
    ExecutionAttemptStatus, ExecutionHistoryQuery, ExecutionStatus, SaveWorkflowInput,
    TriggerKind, WorkerHeartbeatInput, WorkflowExecution, WorkflowExecutionMode, WorkflowRecord,
    STALE_RUNNING_EXECUTION_SECONDS,
};
pub use repository::WorkflowRepository;
