use super::*;

impl WorkflowService {
    /// Creates one workflow definition.
    pub async fn create_workflow(
        &self,
        actor: &UserIdentity,
        input: SaveWorkflowInput,
    ) -> AppResult<WorkflowRecord> {
        self.authorization_service
            .require_role(actor, &[Role::Admin])?;

        // Validate before persisting so invalid payloads never reach storage.
        WorkflowDefinition::new(WorkflowDefinitionInput {
            name: input.name.clone(),
            description: input.description.clone(),
            trigger: input.trigger.clone(),
            actions: input.actions.clone(),
            is_enabled: input.is_enabled,
            owner_subject: input.owner_subject.clone(),
        })?;

        self.repository
            .create_workflow(input, actor.subject())
            .await
    }

    /// Returns one workflow visible to the actor.
    pub async fn get_workflow(
        &self,
        actor: &UserIdentity,
        workflow_id: &str,
    ) -> AppResult<WorkflowRecord> {
        let workflow = self
            .repository
            .find_workflow(workflow_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("workflow '{workflow_id}' not found")))?;

        self.authorization_service.ensure_resource_visible(
            actor,
            "workflow",
            workflow_id,
            workflow.definition.owner_subject(),
        )?;

        Ok(workflow)
    }

    /// Lists workflows visible to the actor, newest first.
    pub async fn list_workflows(&self, actor: &UserIdentity) -> AppResult<Vec<WorkflowRecord>> {
        let mut workflows = self.repository.list_workflows().await?;

        if !matches!(actor.role(), Role::Admin | Role::Staff) {
            workflows.retain(|workflow| {
                workflow
                    .definition
                    .owner_subject()
                    .is_none_or(|owner| owner == actor.subject())
            });
        }

        Ok(workflows)
    }
}
