use tokio::time::Instant;

use super::*;

impl WorkflowService {
    pub(super) async fn start_execution(
        &self,
        actor: &UserIdentity,
        workflow: &WorkflowRecord,
        trigger_kind: TriggerKind,
        trigger_payload: Value,
    ) -> AppResult<WorkflowExecution> {
        // The `running` intent record doubles as the single-flight guard:
        // creation conflicts while another execution of the workflow runs.
        let execution = self
            .repository
            .create_execution(CreateExecutionInput {
                workflow_id: workflow.workflow_id.clone(),
                trigger_kind,
                trigger_payload,
                triggered_by_subject: actor.subject().to_owned(),
                triggered_by_display_name: actor.display_name().to_owned(),
            })
            .await?;

        match self.execution_mode {
            WorkflowExecutionMode::Inline => {
                self.run_to_terminal(&workflow.definition, execution).await
            }
            WorkflowExecutionMode::Queued => {
                self.repository
                    .enqueue_execution_job(execution.execution_id.as_str())
                    .await?;
                Ok(execution)
            }
        }
    }

    pub(super) async fn run_to_terminal(
        &self,
        workflow: &WorkflowDefinition,
        execution: WorkflowExecution,
    ) -> AppResult<WorkflowExecution> {
        let mut last_error: Option<String> = None;

        for attempt_number in 1..=MAX_EXECUTION_ATTEMPTS {
            let context = EngineContext {
                execution_id: execution.execution_id.clone(),
                workflow_id: execution.workflow_id.clone(),
                trigger_payload: execution.trigger_payload.clone(),
                triggered_by_subject: execution.triggered_by_subject.clone(),
                attempt_number,
            };

            let attempt_started = Instant::now();
            let attempt_result = self.engine.execute(workflow, &context).await;
            let duration_ms =
                i64::try_from(attempt_started.elapsed().as_millis()).unwrap_or(i64::MAX);

            match attempt_result {
                Ok(run_result) => {
                    self.record_attempt(ExecutionAttempt {
                        execution_id: execution.execution_id.clone(),
                        attempt_number,
                        status: ExecutionAttemptStatus::Succeeded,
                        error_message: None,
                        duration_ms,
                        executed_at: Utc::now(),
                    })
                    .await;

                    let input = CompleteExecutionInput {
                        execution_id: execution.execution_id.clone(),
                        status: ExecutionStatus::Completed,
                        retry_count: attempt_number - 1,
                        retry_reason: last_error,
                        result: Some(serde_json::json!({
                            "steps": run_result.steps,
                        })),
                        duration_ms: Some(duration_ms),
                    };
                    let completed = self.finalize_execution(execution, input).await;

                    self.notify_terminal(workflow, &completed).await;
                    return Ok(completed);
                }
                Err(error) => {
                    let message = error.to_string();
                    self.record_attempt(ExecutionAttempt {
                        execution_id: execution.execution_id.clone(),
                        attempt_number,
                        status: ExecutionAttemptStatus::Failed,
                        error_message: Some(message.clone()),
                        duration_ms,
                        executed_at: Utc::now(),
                    })
                    .await;
                    last_error = Some(message);

                    let backoff_seconds = 2u64.saturating_pow(
                        u32::try_from(attempt_number).unwrap_or(u32::MAX),
                    );
                    tokio::time::sleep(Duration::from_secs(backoff_seconds)).await;
                }
            }
        }

        let input = CompleteExecutionInput {
            execution_id: execution.execution_id.clone(),
            status: ExecutionStatus::Failed,
            retry_count: MAX_EXECUTION_ATTEMPTS,
            retry_reason: last_error,
            result: None,
            duration_ms: Some(0),
        };
        let failed = self.finalize_execution(execution, input).await;

        tracing::error!(
            execution_id = %failed.execution_id,
            workflow_id = %failed.workflow_id,
            retry_count = failed.retry_count,
            retry_reason = failed.retry_reason.as_deref().unwrap_or("unknown error"),
            "workflow execution failed after all attempts"
        );

        self.notify_terminal(workflow, &failed).await;
        Ok(failed)
    }

    /// Moves the execution to its terminal state.
    ///
    /// The engine outcome is already decided here, so a persistence error
    /// must not turn it into a request failure: the terminal record is
    /// synthesized locally and the error is logged for reconciliation.
    async fn finalize_execution(
        &self,
        execution: WorkflowExecution,
        input: CompleteExecutionInput,
    ) -> WorkflowExecution {
        match self.repository.complete_execution(input.clone()).await {
            Ok(completed) => completed,
            Err(error) => {
                tracing::warn!(
                    execution_id = %execution.execution_id,
                    %error,
                    "failed to persist terminal execution state"
                );

                WorkflowExecution {
                    status: input.status,
                    retry_count: input.retry_count,
                    retry_reason: input.retry_reason,
                    result: input.result,
                    duration_ms: input.duration_ms,
                    finished_at: Some(Utc::now()),
                    ..execution
                }
            }
        }
    }

    async fn record_attempt(&self, attempt: ExecutionAttempt) {
        let execution_id = attempt.execution_id.clone();
        let attempt_number = attempt.attempt_number;

        if let Err(error) = self.repository.append_attempt(attempt).await {
            tracing::warn!(
                execution_id = %execution_id,
                attempt_number,
                %error,
                "failed to record execution attempt"
            );
        }
    }

    async fn notify_terminal(&self, workflow: &WorkflowDefinition, execution: &WorkflowExecution) {
        let (title, message, severity) = match execution.status {
            ExecutionStatus::Completed => (
                "Workflow completed".to_owned(),
                format!(
                    "Workflow '{}' completed after {} attempt(s)",
                    workflow.name().as_str(),
                    execution.retry_count + 1
                ),
                NotificationSeverity::Success,
            ),
            ExecutionStatus::Failed => (
                "Workflow failed".to_owned(),
                format!(
                    "Workflow '{}' failed after {} attempts: {}",
                    workflow.name().as_str(),
                    MAX_EXECUTION_ATTEMPTS,
                    execution.retry_reason.as_deref().unwrap_or("unknown error")
                ),
                NotificationSeverity::Error,
            ),
            ExecutionStatus::Running => return,
        };

        let result = self
            .notification_repository
            .create(CreateNotificationInput {
                recipient_subject: execution.triggered_by_subject.clone(),
                title,
                message,
                severity,
                created_by: SYSTEM_CREATOR.to_owned(),
            })
            .await;

        if let Err(error) = result {
            tracing::warn!(
                execution_id = %execution.execution_id,
                %error,
                "failed to record terminal workflow notification"
            );
        }
    }
}
