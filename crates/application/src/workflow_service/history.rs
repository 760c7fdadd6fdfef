use super::*;

impl WorkflowService {
    /// Returns one execution history page for a workflow, newest first.
    pub async fn execution_history(
        &self,
        actor: &UserIdentity,
        workflow_id: &str,
        query: ExecutionHistoryQuery,
    ) -> AppResult<ExecutionHistoryPage> {
        self.authorization_service
            .require_role(actor, &[Role::Admin, Role::Staff])?;

        let workflow = self.get_workflow(actor, workflow_id).await?;

        let executions = self
            .repository
            .list_executions(workflow.workflow_id.as_str(), query)
            .await?;
        let total = self
            .repository
            .count_executions(workflow.workflow_id.as_str())
            .await?;

        Ok(ExecutionHistoryPage {
            executions,
            page: query.page(),
            limit: query.limit(),
            total,
        })
    }

    /// Lists attempt audit rows for one execution.
    pub async fn execution_attempts(
        &self,
        actor: &UserIdentity,
        execution_id: &str,
    ) -> AppResult<Vec<ExecutionAttempt>> {
        self.authorization_service
            .require_role(actor, &[Role::Admin, Role::Staff])?;

        let execution = self
            .repository
            .find_execution(execution_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("execution '{execution_id}' not found")))?;

        // The parent workflow must still resolve; an orphaned execution
        // surfaces as NotFound rather than leaking attempt rows.
        self.get_workflow(actor, execution.workflow_id.as_str())
            .await?;

        self.repository.list_attempts(execution_id).await
    }
}
