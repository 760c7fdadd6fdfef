use async_trait::async_trait;
use rentfold_application::{
    ClaimedExecutionJob, CompleteExecutionInput, CreateExecutionInput, ExecutionAttempt,
    ExecutionAttemptStatus, ExecutionHistoryQuery, ExecutionStatus, SaveWorkflowInput,
    TriggerKind, WorkerHeartbeatInput, WorkflowExecution, WorkflowRecord, WorkflowRepository,
    STALE_RUNNING_EXECUTION_SECONDS,
};
use rentfold_core::{AppError, AppResult};
use rentfold_domain::{WorkflowAction, WorkflowDefinition, WorkflowDefinitionInput, WorkflowTrigger};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed workflow repository.
#[derive(Clone)]
pub struct PostgresWorkflowRepository {
    pool: PgPool,
}

impl PostgresWorkflowRepository {
    /// Creates a workflow repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct WorkflowRow {
    id: uuid::Uuid,
    name: String,
    description: Option<String>,
    trigger_type: String,
    trigger_event_name: Option<String>,
    trigger_cron_expression: Option<String>,
    actions: Value,
    is_enabled: bool,
    owner_subject: Option<String>,
    created_by: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, FromRow)]
struct ExecutionRow {
    id: uuid::Uuid,
    workflow_id: uuid::Uuid,
    trigger_kind: String,
    trigger_payload: Value,
    status: String,
    retry_count: i32,
    retry_reason: Option<String>,
    result: Option<Value>,
    duration_ms: Option<i64>,
    triggered_by_subject: String,
    triggered_by_display_name: String,
    started_at: chrono::DateTime<chrono::Utc>,
    finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, FromRow)]
struct AttemptRow {
    execution_id: uuid::Uuid,
    attempt_number: i32,
    status: String,
    error_message: Option<String>,
    duration_ms: i64,
    executed_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, FromRow)]
struct ClaimedJobRow {
    job_id: uuid::Uuid,
    lease_token: uuid::Uuid,
    execution_id: uuid::Uuid,
    trigger_payload: Value,
    triggered_by_subject: String,
    triggered_by_display_name: String,
    workflow_id: uuid::Uuid,
    name: String,
    description: Option<String>,
    trigger_type: String,
    trigger_event_name: Option<String>,
    trigger_cron_expression: Option<String>,
    actions: Value,
    is_enabled: bool,
    owner_subject: Option<String>,
}

const EXECUTION_COLUMNS: &str = r#"
    id,
    workflow_id,
    trigger_kind,
    trigger_payload,
    status,
    retry_count,
    retry_reason,
    result,
    duration_ms,
    triggered_by_subject,
    triggered_by_display_name,
    started_at,
    finished_at
"#;

#[async_trait]
impl WorkflowRepository for PostgresWorkflowRepository {
    async fn create_workflow(
        &self,
        input: SaveWorkflowInput,
        created_by: &str,
    ) -> AppResult<WorkflowRecord> {
        let (trigger_type, trigger_event_name, trigger_cron_expression) =
            trigger_parts(&input.trigger);
        let actions = actions_to_json(input.actions.as_slice())?;

        let row = sqlx::query_as::<_, WorkflowRow>(
            r#"
            INSERT INTO workflow_definitions (
                name,
                description,
                trigger_type,
                trigger_event_name,
                trigger_cron_expression,
                actions,
                is_enabled,
                owner_subject,
                created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id,
                name,
                description,
                trigger_type,
                trigger_event_name,
                trigger_cron_expression,
                actions,
                is_enabled,
                owner_subject,
                created_by,
                created_at
            "#,
        )
        .bind(input.name)
        .bind(input.description)
        .bind(trigger_type)
        .bind(trigger_event_name)
        .bind(trigger_cron_expression)
        .bind(actions)
        .bind(input.is_enabled)
        .bind(input.owner_subject)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create workflow: {error}")))?;

        workflow_from_row(row)
    }

    async fn find_workflow(&self, workflow_id: &str) -> AppResult<Option<WorkflowRecord>> {
        let workflow_uuid = parse_id(workflow_id, "workflow")?;

        let row = sqlx::query_as::<_, WorkflowRow>(
            r#"
            SELECT
                id,
                name,
                description,
                trigger_type,
                trigger_event_name,
                trigger_cron_expression,
                actions,
                is_enabled,
                owner_subject,
                created_by,
                created_at
            FROM workflow_definitions
            WHERE id = $1
            "#,
        )
        .bind(workflow_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find workflow '{workflow_id}': {error}"))
        })?;

        row.map(workflow_from_row).transpose()
    }

    async fn list_workflows(&self) -> AppResult<Vec<WorkflowRecord>> {
        let rows = sqlx::query_as::<_, WorkflowRow>(
            r#"
            SELECT
                id,
                name,
                description,
                trigger_type,
                trigger_event_name,
                trigger_cron_expression,
                actions,
                is_enabled,
                owner_subject,
                created_by,
                created_at
            FROM workflow_definitions
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list workflows: {error}")))?;

        rows.into_iter().map(workflow_from_row).collect()
    }

    async fn list_event_workflows(&self, event_name: &str) -> AppResult<Vec<WorkflowRecord>> {
        let rows = sqlx::query_as::<_, WorkflowRow>(
            r#"
            SELECT
                id,
                name,
                description,
                trigger_type,
                trigger_event_name,
                trigger_cron_expression,
                actions,
                is_enabled,
                owner_subject,
                created_by,
                created_at
            FROM workflow_definitions
            WHERE is_enabled = true
              AND trigger_type = 'event'
              AND trigger_event_name = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(event_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list workflows for event '{event_name}': {error}"
            ))
        })?;

        rows.into_iter().map(workflow_from_row).collect()
    }

    async fn create_execution(&self, input: CreateExecutionInput) -> AppResult<WorkflowExecution> {
        let workflow_uuid = parse_id(input.workflow_id.as_str(), "workflow")?;

        // A running row whose writer died (crash mid-run, failed terminal
        // write) would hold the one-running-execution index forever. Fail
        // rows past the staleness bound before creating the new intent.
        sqlx::query(
            r#"
            UPDATE workflow_executions
            SET
                status = 'failed',
                retry_reason = 'execution abandoned before reaching a terminal state',
                finished_at = now()
            WHERE workflow_id = $1
              AND status = 'running'
              AND started_at < now() - make_interval(secs => $2)
            "#,
        )
        .bind(workflow_uuid)
        .bind(f64::from(STALE_RUNNING_EXECUTION_SECONDS))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to reclaim stale executions for workflow '{}': {error}",
                input.workflow_id
            ))
        })?;

        let row = sqlx::query_as::<_, ExecutionRow>(&format!(
            r#"
            INSERT INTO workflow_executions (
                workflow_id,
                trigger_kind,
                trigger_payload,
                status,
                triggered_by_subject,
                triggered_by_display_name
            )
            VALUES ($1, $2, $3, 'running', $4, $5)
            RETURNING {EXECUTION_COLUMNS}
            "#
        ))
        .bind(workflow_uuid)
        .bind(input.trigger_kind.as_str())
        .bind(input.trigger_payload)
        .bind(input.triggered_by_subject)
        .bind(input.triggered_by_display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| running_conflict_or_internal(error, input.workflow_id.as_str()))?;

        execution_from_row(row)
    }

    async fn complete_execution(
        &self,
        input: CompleteExecutionInput,
    ) -> AppResult<WorkflowExecution> {
        let execution_uuid = parse_id(input.execution_id.as_str(), "execution")?;

        let row = sqlx::query_as::<_, ExecutionRow>(&format!(
            r#"
            UPDATE workflow_executions
            SET
                status = $2,
                retry_count = $3,
                retry_reason = $4,
                result = $5,
                duration_ms = $6,
                finished_at = now()
            WHERE id = $1
            RETURNING {EXECUTION_COLUMNS}
            "#
        ))
        .bind(execution_uuid)
        .bind(input.status.as_str())
        .bind(input.retry_count)
        .bind(input.retry_reason)
        .bind(input.result)
        .bind(input.duration_ms)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to complete execution '{}': {error}",
                input.execution_id
            ))
        })?;

        execution_from_row(row)
    }

    async fn append_attempt(&self, attempt: ExecutionAttempt) -> AppResult<()> {
        let execution_uuid = parse_id(attempt.execution_id.as_str(), "execution")?;

        sqlx::query(
            r#"
            INSERT INTO workflow_execution_attempts (
                execution_id,
                attempt_number,
                status,
                error_message,
                duration_ms,
                executed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(execution_uuid)
        .bind(attempt.attempt_number)
        .bind(attempt.status.as_str())
        .bind(attempt.error_message)
        .bind(attempt.duration_ms)
        .bind(attempt.executed_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to append attempt for execution '{}': {error}",
                attempt.execution_id
            ))
        })?;

        Ok(())
    }

    async fn list_executions(
        &self,
        workflow_id: &str,
        query: ExecutionHistoryQuery,
    ) -> AppResult<Vec<WorkflowExecution>> {
        let workflow_uuid = parse_id(workflow_id, "workflow")?;

        let rows = sqlx::query_as::<_, ExecutionRow>(&format!(
            r#"
            SELECT {EXECUTION_COLUMNS}
            FROM workflow_executions
            WHERE workflow_id = $1
            ORDER BY started_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(workflow_uuid)
        .bind(i64::from(query.limit()))
        .bind(i64::from(query.offset()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list executions for workflow '{workflow_id}': {error}"
            ))
        })?;

        rows.into_iter().map(execution_from_row).collect()
    }

    async fn count_executions(&self, workflow_id: &str) -> AppResult<u64> {
        let workflow_uuid = parse_id(workflow_id, "workflow")?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM workflow_executions WHERE workflow_id = $1",
        )
        .bind(workflow_uuid)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to count executions for workflow '{workflow_id}': {error}"
            ))
        })?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn find_execution(&self, execution_id: &str) -> AppResult<Option<WorkflowExecution>> {
        let execution_uuid = parse_id(execution_id, "execution")?;

        let row = sqlx::query_as::<_, ExecutionRow>(&format!(
            r#"
            SELECT {EXECUTION_COLUMNS}
            FROM workflow_executions
            WHERE id = $1
            "#
        ))
        .bind(execution_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find execution '{execution_id}': {error}"
            ))
        })?;

        row.map(execution_from_row).transpose()
    }

    async fn list_attempts(&self, execution_id: &str) -> AppResult<Vec<ExecutionAttempt>> {
        let execution_uuid = parse_id(execution_id, "execution")?;

        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT execution_id, attempt_number, status, error_message, duration_ms, executed_at
            FROM workflow_execution_attempts
            WHERE execution_id = $1
            ORDER BY attempt_number
            "#,
        )
        .bind(execution_uuid)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list attempts for execution '{execution_id}': {error}"
            ))
        })?;

        rows.into_iter().map(attempt_from_row).collect()
    }

    async fn enqueue_execution_job(&self, execution_id: &str) -> AppResult<()> {
        let execution_uuid = parse_id(execution_id, "execution")?;

        sqlx::query(
            "INSERT INTO workflow_execution_jobs (execution_id, status) VALUES ($1, 'pending')",
        )
        .bind(execution_uuid)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to enqueue job for execution '{execution_id}': {error}"
            ))
        })?;

        Ok(())
    }

    async fn claim_execution_jobs(
        &self,
        worker_id: &str,
        batch_size: u32,
        lease_seconds: u32,
    ) -> AppResult<Vec<ClaimedExecutionJob>> {
        // An expired claim is claimable again; the fresh lease token fences
        // out the previous holder on complete/release.
        let rows = sqlx::query_as::<_, ClaimedJobRow>(
            r#"
            WITH pending AS (
                SELECT id
                FROM workflow_execution_jobs
                WHERE status = 'pending'
                   OR (status = 'claimed' AND claimed_at < now() - make_interval(secs => $3))
                ORDER BY created_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            ),
            claimed AS (
                UPDATE workflow_execution_jobs AS job
                SET
                    status = 'claimed',
                    worker_id = $1,
                    lease_token = gen_random_uuid(),
                    claimed_at = now()
                FROM pending
                WHERE job.id = pending.id
                RETURNING job.id, job.execution_id, job.lease_token
            )
            SELECT
                claimed.id AS job_id,
                claimed.lease_token,
                execution.id AS execution_id,
                execution.trigger_payload,
                execution.triggered_by_subject,
                execution.triggered_by_display_name,
                workflow.id AS workflow_id,
                workflow.name,
                workflow.description,
                workflow.trigger_type,
                workflow.trigger_event_name,
                workflow.trigger_cron_expression,
                workflow.actions,
                workflow.is_enabled,
                workflow.owner_subject
            FROM claimed
            JOIN workflow_executions AS execution ON execution.id = claimed.execution_id
            JOIN workflow_definitions AS workflow ON workflow.id = execution.workflow_id
            "#,
        )
        .bind(worker_id)
        .bind(i64::from(batch_size))
        .bind(f64::from(lease_seconds))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to claim jobs for worker '{worker_id}': {error}"
            ))
        })?;

        rows.into_iter().map(claimed_job_from_row).collect()
    }

    async fn complete_execution_job(&self, job_id: &str, lease_token: &str) -> AppResult<()> {
        let job_uuid = parse_id(job_id, "job")?;
        let lease_uuid = parse_id(lease_token, "lease token")?;

        sqlx::query(
            r#"
            UPDATE workflow_execution_jobs
            SET status = 'done', finished_at = now()
            WHERE id = $1 AND lease_token = $2
            "#,
        )
        .bind(job_uuid)
        .bind(lease_uuid)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to complete job '{job_id}': {error}"))
        })?;

        Ok(())
    }

    async fn release_execution_job(&self, job_id: &str, lease_token: &str) -> AppResult<()> {
        let job_uuid = parse_id(job_id, "job")?;
        let lease_uuid = parse_id(lease_token, "lease token")?;

        sqlx::query(
            r#"
            UPDATE workflow_execution_jobs
            SET status = 'pending', worker_id = NULL, lease_token = NULL, claimed_at = NULL
            WHERE id = $1 AND lease_token = $2
            "#,
        )
        .bind(job_uuid)
        .bind(lease_uuid)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to release job '{job_id}': {error}"))
        })?;

        Ok(())
    }

    async fn upsert_worker_heartbeat(
        &self,
        worker_id: &str,
        input: WorkerHeartbeatInput,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workflow_worker_heartbeats (
                worker_id,
                claimed_jobs,
                executed_jobs,
                failed_jobs,
                seen_at
            )
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (worker_id)
            DO UPDATE SET
                claimed_jobs = EXCLUDED.claimed_jobs,
                executed_jobs = EXCLUDED.executed_jobs,
                failed_jobs = EXCLUDED.failed_jobs,
                seen_at = now()
            "#,
        )
        .bind(worker_id)
        .bind(i64::from(input.claimed_jobs))
        .bind(i64::from(input.executed_jobs))
        .bind(i64::from(input.failed_jobs))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to upsert heartbeat for worker '{worker_id}': {error}"
            ))
        })?;

        Ok(())
    }
}

fn parse_id(value: &str, kind: &str) -> AppResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|error| AppError::Validation(format!("invalid {kind} id '{value}': {error}")))
}

fn running_conflict_or_internal(error: sqlx::Error, workflow_id: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "workflow '{workflow_id}' already has a running execution"
        ));
    }

    AppError::Internal(format!(
        "failed to create execution for workflow '{workflow_id}': {error}"
    ))
}

fn trigger_parts(trigger: &WorkflowTrigger) -> (&'static str, Option<&str>, Option<&str>) {
    match trigger {
        WorkflowTrigger::Manual => ("manual", None, None),
        WorkflowTrigger::Event { event_name } => ("event", Some(event_name.as_str()), None),
        WorkflowTrigger::Schedule { cron_expression } => {
            ("schedule", None, Some(cron_expression.as_str()))
        }
    }
}

fn trigger_from_parts(
    trigger_type: &str,
    trigger_event_name: Option<String>,
    trigger_cron_expression: Option<String>,
) -> AppResult<WorkflowTrigger> {
    match trigger_type {
        "manual" => Ok(WorkflowTrigger::Manual),
        "event" => {
            let event_name = trigger_event_name.ok_or_else(|| {
                AppError::Validation("event trigger requires trigger_event_name".to_owned())
            })?;

            Ok(WorkflowTrigger::Event { event_name })
        }
        "schedule" => {
            let cron_expression = trigger_cron_expression.ok_or_else(|| {
                AppError::Validation(
                    "schedule trigger requires trigger_cron_expression".to_owned(),
                )
            })?;

            Ok(WorkflowTrigger::Schedule { cron_expression })
        }
        _ => Err(AppError::Validation(format!(
            "unknown workflow trigger_type '{trigger_type}'"
        ))),
    }
}

fn actions_to_json(actions: &[WorkflowAction]) -> AppResult<Value> {
    serde_json::to_value(actions).map_err(|error| {
        AppError::Validation(format!("failed to serialize workflow actions: {error}"))
    })
}

fn actions_from_json(value: Value) -> AppResult<Vec<WorkflowAction>> {
    serde_json::from_value(value).map_err(|error| {
        AppError::Validation(format!("failed to deserialize workflow actions: {error}"))
    })
}

fn workflow_from_row(row: WorkflowRow) -> AppResult<WorkflowRecord> {
    let definition = WorkflowDefinition::new(WorkflowDefinitionInput {
        name: row.name,
        description: row.description,
        trigger: trigger_from_parts(
            row.trigger_type.as_str(),
            row.trigger_event_name,
            row.trigger_cron_expression,
        )?,
        actions: actions_from_json(row.actions)?,
        is_enabled: row.is_enabled,
        owner_subject: row.owner_subject,
    })?;

    Ok(WorkflowRecord {
        workflow_id: row.id.to_string(),
        definition,
        created_by: row.created_by,
        created_at: row.created_at,
    })
}

fn execution_from_row(row: ExecutionRow) -> AppResult<WorkflowExecution> {
    Ok(WorkflowExecution {
        execution_id: row.id.to_string(),
        workflow_id: row.workflow_id.to_string(),
        trigger_kind: TriggerKind::parse(row.trigger_kind.as_str())?,
        trigger_payload: row.trigger_payload,
        status: ExecutionStatus::parse(row.status.as_str())?,
        retry_count: row.retry_count,
        retry_reason: row.retry_reason,
        result: row.result,
        duration_ms: row.duration_ms,
        triggered_by_subject: row.triggered_by_subject,
        triggered_by_display_name: row.triggered_by_display_name,
        started_at: row.started_at,
        finished_at: row.finished_at,
    })
}

fn attempt_from_row(row: AttemptRow) -> AppResult<ExecutionAttempt> {
    Ok(ExecutionAttempt {
        execution_id: row.execution_id.to_string(),
        attempt_number: row.attempt_number,
        status: ExecutionAttemptStatus::parse(row.status.as_str())?,
        error_message: row.error_message,
        duration_ms: row.duration_ms,
        executed_at: row.executed_at,
    })
}

fn claimed_job_from_row(row: ClaimedJobRow) -> AppResult<ClaimedExecutionJob> {
    let workflow = WorkflowDefinition::new(WorkflowDefinitionInput {
        name: row.name,
        description: row.description,
        trigger: trigger_from_parts(
            row.trigger_type.as_str(),
            row.trigger_event_name,
            row.trigger_cron_expression,
        )?,
        actions: actions_from_json(row.actions)?,
        is_enabled: row.is_enabled,
        owner_subject: row.owner_subject,
    })?;

    Ok(ClaimedExecutionJob {
        job_id: row.job_id.to_string(),
        execution_id: row.execution_id.to_string(),
        workflow_id: row.workflow_id.to_string(),
        workflow,
        trigger_payload: row.trigger_payload,
        triggered_by_subject: row.triggered_by_subject,
        triggered_by_display_name: row.triggered_by_display_name,
        lease_token: row.lease_token.to_string(),
    })
}
