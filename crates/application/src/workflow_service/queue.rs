use super::*;

impl WorkflowService {
    /// Claims queued execution jobs for one worker.
    pub async fn claim_jobs_for_worker(
        &self,
        worker_id: &str,
        batch_size: u32,
        lease_seconds: u32,
    ) -> AppResult<Vec<ClaimedExecutionJob>> {
        self.require_queued_mode()?;

        if worker_id.trim().is_empty() {
            return Err(AppError::Validation(
                "worker_id must not be empty".to_owned(),
            ));
        }

        if batch_size == 0 {
            return Err(AppError::Validation(
                "batch_size must be greater than zero".to_owned(),
            ));
        }

        if lease_seconds == 0 {
            return Err(AppError::Validation(
                "lease_seconds must be greater than zero".to_owned(),
            ));
        }

        self.repository
            .claim_execution_jobs(worker_id, batch_size, lease_seconds)
            .await
    }

    /// Runs one claimed job to a terminal execution state and finalizes
    /// queue state.
    pub async fn execute_claimed_job(
        &self,
        worker_id: &str,
        job: ClaimedExecutionJob,
    ) -> AppResult<WorkflowExecution> {
        self.require_queued_mode()?;

        if job.lease_token.trim().is_empty() {
            return Err(AppError::Validation(
                "claimed job lease_token must not be empty".to_owned(),
            ));
        }

        let execution = self
            .repository
            .find_execution(job.execution_id.as_str())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("execution '{}' not found", job.execution_id))
            })?;

        // A terminal execution means another worker already finished the
        // work; release queue state and hand the record back.
        if execution.status != ExecutionStatus::Running {
            self.repository
                .complete_execution_job(job.job_id.as_str(), job.lease_token.as_str())
                .await?;
            return Ok(execution);
        }

        let run_result = self.run_to_terminal(&job.workflow, execution).await;

        match run_result {
            Ok(completed) => {
                self.repository
                    .complete_execution_job(job.job_id.as_str(), job.lease_token.as_str())
                    .await?;
                Ok(completed)
            }
            Err(error) => {
                if let Err(release_error) = self
                    .repository
                    .release_execution_job(job.job_id.as_str(), job.lease_token.as_str())
                    .await
                {
                    return Err(AppError::Internal(format!(
                        "failed to execute claimed job '{}' for worker '{worker_id}': {error}; additionally failed to release the job: {release_error}",
                        job.job_id
                    )));
                }

                Err(error)
            }
        }
    }

    /// Stores one worker heartbeat snapshot for queue observability.
    pub async fn heartbeat_worker(
        &self,
        worker_id: &str,
        input: WorkerHeartbeatInput,
    ) -> AppResult<()> {
        self.require_queued_mode()?;

        if worker_id.trim().is_empty() {
            return Err(AppError::Validation(
                "worker_id must not be empty".to_owned(),
            ));
        }

        self.repository.upsert_worker_heartbeat(worker_id, input).await
    }

    fn require_queued_mode(&self) -> AppResult<()> {
        if self.execution_mode != WorkflowExecutionMode::Queued {
            return Err(AppError::Conflict(
                "queued workflow execution mode is not enabled".to_owned(),
            ));
        }

        Ok(())
    }
}
