use super::*;

impl WorkflowService {
    /// Executes one workflow on behalf of the actor.
    ///
    /// Inline mode returns the terminal execution. Queued mode returns the
    /// `running` intent record after enqueueing the job.
    pub async fn execute_workflow(
        &self,
        actor: &UserIdentity,
        workflow_id: &str,
        trigger_payload: Value,
    ) -> AppResult<WorkflowExecution> {
        self.authorization_service
            .require_role(actor, &[Role::Admin, Role::Staff])?;

        let workflow = self.get_workflow(actor, workflow_id).await?;

        if !workflow.definition.is_enabled() {
            return Err(AppError::Validation(format!(
                "workflow '{workflow_id}' is disabled"
            )));
        }

        self.start_execution(actor, &workflow, TriggerKind::Manual, trigger_payload)
            .await
    }

    /// Starts every enabled workflow whose event trigger matches
    /// `event_name` and returns how many were started.
    pub async fn dispatch_event(
        &self,
        actor: &UserIdentity,
        event_name: &str,
        event_payload: Value,
    ) -> AppResult<usize> {
        self.authorization_service
            .require_role(actor, &[Role::Admin, Role::Staff])?;

        if event_name.trim().is_empty() {
            return Err(AppError::Validation(
                "event_name must not be empty".to_owned(),
            ));
        }

        let workflows = self.repository.list_event_workflows(event_name).await?;

        let mut started = 0;
        for workflow in workflows {
            let payload = serde_json::json!({
                "event_name": event_name,
                "event_payload": event_payload,
            });

            match self
                .start_execution(actor, &workflow, TriggerKind::Event, payload)
                .await
            {
                Ok(_) => started += 1,
                Err(error) => {
                    tracing::warn!(
                        workflow_id = %workflow.workflow_id,
                        event_name,
                        %error,
                        "event dispatch skipped workflow"
                    );
                }
            }
        }

        Ok(started)
    }
}
