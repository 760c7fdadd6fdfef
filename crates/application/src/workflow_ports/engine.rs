use async_trait::async_trait;
use rentfold_core::AppResult;
use rentfold_domain::WorkflowDefinition;
use serde::Serialize;
use serde_json::Value;

/// Context handed to the engine for one execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineContext {
    /// Execution identifier the attempt belongs to.
    pub execution_id: String,
    /// Workflow identifier.
    pub workflow_id: String,
    /// Trigger payload captured when the execution was created.
    pub trigger_payload: Value,
    /// Subject of the triggering actor.
    pub triggered_by_subject: String,
    /// 1-based attempt sequence.
    pub attempt_number: i32,
}

/// Outcome of one executed workflow action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    /// Action type value for the executed step.
    pub action_type: String,
    /// Human-readable step detail.
    pub detail: String,
}

/// Result of one successful engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRunResult {
    /// Per-action outcomes in execution order.
    pub steps: Vec<StepOutcome>,
}

/// Port executing workflow actions for one attempt.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    /// Runs every action of the workflow in order, failing on the first
    /// action error.
    async fn execute(
        &self,
        workflow: &WorkflowDefinition,
        context: &EngineContext,
    ) -> AppResult<EngineRunResult>;
}
