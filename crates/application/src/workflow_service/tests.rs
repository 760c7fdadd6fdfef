use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use tokio::sync::Mutex;

use rentfold_core::{AppError, AppResult, Role, UserIdentity};
use rentfold_domain::{
    WorkflowAction, WorkflowDefinition, WorkflowDefinitionInput, WorkflowTrigger,
};

use crate::notification_ports::{CreateNotificationInput, Notification, NotificationRepository};
use crate::workflow_ports::{
    ClaimedExecutionJob, CompleteExecutionInput, CreateExecutionInput, EngineContext,
    EngineRunResult, ExecutionAttempt, ExecutionHistoryQuery, ExecutionStatus, SaveWorkflowInput,
    StepOutcome, TriggerKind, WorkerHeartbeatInput, WorkflowEngine, WorkflowExecution,
    WorkflowExecutionMode, WorkflowRecord, WorkflowRepository, STALE_RUNNING_EXECUTION_SECONDS,
};
use crate::AuthorizationService;

use super::WorkflowService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FakeJobState {
    Pending,
    Claimed,
    Done,
}

struct FakeJob {
    job_id: String,
    execution_id: String,
    lease_token: Option<String>,
    state: FakeJobState,
}

#[derive(Default)]
struct FakeWorkflowRepository {
    workflows: Mutex<Vec<WorkflowRecord>>,
    executions: Mutex<Vec<WorkflowExecution>>,
    attempts: Mutex<Vec<ExecutionAttempt>>,
    jobs: Mutex<Vec<FakeJob>>,
    heartbeats: Mutex<Vec<(String, WorkerHeartbeatInput)>>,
}

#[async_trait]
impl WorkflowRepository for FakeWorkflowRepository {
    async fn create_workflow(
        &self,
        input: SaveWorkflowInput,
        created_by: &str,
    ) -> AppResult<WorkflowRecord> {
        let definition = WorkflowDefinition::new(WorkflowDefinitionInput {
            name: input.name,
            description: input.description,
            trigger: input.trigger,
            actions: input.actions,
            is_enabled: input.is_enabled,
            owner_subject: input.owner_subject,
        })?;

        let mut workflows = self.workflows.lock().await;
        let record = WorkflowRecord {
            workflow_id: format!("wf-{}", workflows.len() + 1),
            definition,
            created_by: created_by.to_owned(),
            created_at: Utc::now(),
        };
        workflows.push(record.clone());
        Ok(record)
    }

    async fn find_workflow(&self, workflow_id: &str) -> AppResult<Option<WorkflowRecord>> {
        Ok(self
            .workflows
            .lock()
            .await
            .iter()
            .find(|workflow| workflow.workflow_id == workflow_id)
            .cloned())
    }

    async fn list_workflows(&self) -> AppResult<Vec<WorkflowRecord>> {
        Ok(self.workflows.lock().await.clone())
    }

    async fn list_event_workflows(&self, event_name: &str) -> AppResult<Vec<WorkflowRecord>> {
        Ok(self
            .workflows
            .lock()
            .await
            .iter()
            .filter(|workflow| {
                workflow.definition.is_enabled()
                    && workflow.definition.trigger().event_name() == Some(event_name)
            })
            .cloned()
            .collect())
    }

    async fn create_execution(&self, input: CreateExecutionInput) -> AppResult<WorkflowExecution> {
        let mut executions = self.executions.lock().await;

        // Mirrors the abandoned-row reclaim the Postgres repository performs
        // before enforcing the one-running-execution constraint.
        let stale_cutoff =
            Utc::now() - ChronoDuration::seconds(i64::from(STALE_RUNNING_EXECUTION_SECONDS));
        for execution in executions.iter_mut() {
            if execution.workflow_id == input.workflow_id
                && execution.status == ExecutionStatus::Running
                && execution.started_at < stale_cutoff
            {
                execution.status = ExecutionStatus::Failed;
                execution.retry_reason =
                    Some("execution abandoned before reaching a terminal state".to_owned());
                execution.finished_at = Some(Utc::now());
            }
        }

        if executions.iter().any(|execution| {
            execution.workflow_id == input.workflow_id
                && execution.status == ExecutionStatus::Running
        }) {
            return Err(AppError::Conflict(format!(
                "workflow '{}' already has a running execution",
                input.workflow_id
            )));
        }

        let execution = WorkflowExecution {
            execution_id: format!("exec-{}", executions.len() + 1),
            workflow_id: input.workflow_id,
            trigger_kind: input.trigger_kind,
            trigger_payload: input.trigger_payload,
            status: ExecutionStatus::Running,
            retry_count: 0,
            retry_reason: None,
            result: None,
            duration_ms: None,
            triggered_by_subject: input.triggered_by_subject,
            triggered_by_display_name: input.triggered_by_display_name,
            started_at: Utc::now(),
            finished_at: None,
        };
        executions.push(execution.clone());
        Ok(execution)
    }

    async fn complete_execution(
        &self,
        input: CompleteExecutionInput,
    ) -> AppResult<WorkflowExecution> {
        let mut executions = self.executions.lock().await;
        let execution = executions
            .iter_mut()
            .find(|execution| execution.execution_id == input.execution_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("execution '{}' not found", input.execution_id))
            })?;

        execution.status = input.status;
        execution.retry_count = input.retry_count;
        execution.retry_reason = input.retry_reason;
        execution.result = input.result;
        execution.duration_ms = input.duration_ms;
        execution.finished_at = Some(Utc::now());
        Ok(execution.clone())
    }

    async fn append_attempt(&self, attempt: ExecutionAttempt) -> AppResult<()> {
        self.attempts.lock().await.push(attempt);
        Ok(())
    }

    async fn list_executions(
        &self,
        workflow_id: &str,
        query: ExecutionHistoryQuery,
    ) -> AppResult<Vec<WorkflowExecution>> {
        let mut executions: Vec<WorkflowExecution> = self
            .executions
            .lock()
            .await
            .iter()
            .filter(|execution| execution.workflow_id == workflow_id)
            .cloned()
            .collect();
        executions.sort_by(|left, right| right.started_at.cmp(&left.started_at));

        Ok(executions
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .collect())
    }

    async fn count_executions(&self, workflow_id: &str) -> AppResult<u64> {
        Ok(self
            .executions
            .lock()
            .await
            .iter()
            .filter(|execution| execution.workflow_id == workflow_id)
            .count() as u64)
    }

    async fn find_execution(&self, execution_id: &str) -> AppResult<Option<WorkflowExecution>> {
        Ok(self
            .executions
            .lock()
            .await
            .iter()
            .find(|execution| execution.execution_id == execution_id)
            .cloned())
    }

    async fn list_attempts(&self, execution_id: &str) -> AppResult<Vec<ExecutionAttempt>> {
        Ok(self
            .attempts
            .lock()
            .await
            .iter()
            .filter(|attempt| attempt.execution_id == execution_id)
            .cloned()
            .collect())
    }

    async fn enqueue_execution_job(&self, execution_id: &str) -> AppResult<()> {
        let mut jobs = self.jobs.lock().await;
        let job_id = format!("job-{}", jobs.len() + 1);
        jobs.push(FakeJob {
            job_id,
            execution_id: execution_id.to_owned(),
            lease_token: None,
            state: FakeJobState::Pending,
        });
        Ok(())
    }

    async fn claim_execution_jobs(
        &self,
        _worker_id: &str,
        batch_size: u32,
        _lease_seconds: u32,
    ) -> AppResult<Vec<ClaimedExecutionJob>> {
        let executions = self.executions.lock().await.clone();
        let workflows = self.workflows.lock().await.clone();
        let mut jobs = self.jobs.lock().await;

        let mut claimed = Vec::new();
        for job in jobs
            .iter_mut()
            .filter(|job| job.state == FakeJobState::Pending)
            .take(batch_size as usize)
        {
            let execution = executions
                .iter()
                .find(|execution| execution.execution_id == job.execution_id)
                .ok_or_else(|| {
                    AppError::Internal(format!("execution '{}' missing", job.execution_id))
                })?;
            let workflow = workflows
                .iter()
                .find(|workflow| workflow.workflow_id == execution.workflow_id)
                .ok_or_else(|| {
                    AppError::Internal(format!("workflow '{}' missing", execution.workflow_id))
                })?;

            let lease_token = format!("lease-{}", job.job_id);
            job.state = FakeJobState::Claimed;
            job.lease_token = Some(lease_token.clone());
            claimed.push(ClaimedExecutionJob {
                job_id: job.job_id.clone(),
                execution_id: execution.execution_id.clone(),
                workflow_id: workflow.workflow_id.clone(),
                workflow: workflow.definition.clone(),
                trigger_payload: execution.trigger_payload.clone(),
                triggered_by_subject: execution.triggered_by_subject.clone(),
                triggered_by_display_name: execution.triggered_by_display_name.clone(),
                lease_token,
            });
        }

        Ok(claimed)
    }

    async fn complete_execution_job(&self, job_id: &str, lease_token: &str) -> AppResult<()> {
        let mut jobs = self.jobs.lock().await;
        for job in jobs.iter_mut() {
            if job.job_id == job_id && job.lease_token.as_deref() == Some(lease_token) {
                job.state = FakeJobState::Done;
            }
        }
        Ok(())
    }

    async fn release_execution_job(&self, job_id: &str, lease_token: &str) -> AppResult<()> {
        let mut jobs = self.jobs.lock().await;
        for job in jobs.iter_mut() {
            if job.job_id == job_id && job.lease_token.as_deref() == Some(lease_token) {
                job.state = FakeJobState::Pending;
                job.lease_token = None;
            }
        }
        Ok(())
    }

    async fn upsert_worker_heartbeat(
        &self,
        worker_id: &str,
        input: WorkerHeartbeatInput,
    ) -> AppResult<()> {
        self.heartbeats
            .lock()
            .await
            .push((worker_id.to_owned(), input));
        Ok(())
    }
}

#[derive(Default)]
struct FakeWorkflowEngine {
    failures_remaining: Mutex<i32>,
}

#[async_trait]
impl WorkflowEngine for FakeWorkflowEngine {
    async fn execute(
        &self,
        _workflow: &WorkflowDefinition,
        _context: &EngineContext,
    ) -> AppResult<EngineRunResult> {
        let mut failures_remaining = self.failures_remaining.lock().await;
        if *failures_remaining > 0 {
            *failures_remaining -= 1;
            return Err(AppError::Internal(
                "simulated workflow action failure".to_owned(),
            ));
        }

        Ok(EngineRunResult {
            steps: vec![StepOutcome {
                action_type: "log_message".to_owned(),
                detail: "logged".to_owned(),
            }],
        })
    }
}

#[derive(Default)]
struct FakeNotificationRepository {
    notifications: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationRepository for FakeNotificationRepository {
    async fn create(&self, input: CreateNotificationInput) -> AppResult<Notification> {
        let mut notifications = self.notifications.lock().await;
        let notification = Notification {
            notification_id: format!("notification-{}", notifications.len() + 1),
            recipient_subject: input.recipient_subject,
            title: input.title,
            message: input.message,
            severity: input.severity,
            created_by: input.created_by,
            is_read: false,
            created_at: Utc::now(),
        };
        notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_for_recipient(
        &self,
        recipient_subject: &str,
        limit: u32,
    ) -> AppResult<Vec<Notification>> {
        Ok(self
            .notifications
            .lock()
            .await
            .iter()
            .filter(|notification| notification.recipient_subject == recipient_subject)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find(&self, notification_id: &str) -> AppResult<Option<Notification>> {
        Ok(self
            .notifications
            .lock()
            .await
            .iter()
            .find(|notification| notification.notification_id == notification_id)
            .cloned())
    }

    async fn mark_read(&self, _notification_id: &str) -> AppResult<()> {
        Ok(())
    }
}

struct Harness {
    service: WorkflowService,
    repository: Arc<FakeWorkflowRepository>,
    engine: Arc<FakeWorkflowEngine>,
    notifications: Arc<FakeNotificationRepository>,
}

fn harness(mode: WorkflowExecutionMode) -> Harness {
    let repository = Arc::new(FakeWorkflowRepository::default());
    let engine = Arc::new(FakeWorkflowEngine::default());
    let notifications = Arc::new(FakeNotificationRepository::default());

    let service = WorkflowService::new(
        AuthorizationService::new(),
        repository.clone(),
        engine.clone(),
        notifications.clone(),
        mode,
    );

    Harness {
        service,
        repository,
        engine,
        notifications,
    }
}

fn admin() -> UserIdentity {
    UserIdentity::new(
        "admin-1".to_owned(),
        "Avery Administrator".to_owned(),
        Some("avery@example.com".to_owned()),
        Role::Admin,
    )
}

fn staff() -> UserIdentity {
    UserIdentity::new(
        "staff-1".to_owned(),
        "Dana Property Manager".to_owned(),
        Some("dana@example.com".to_owned()),
        Role::Staff,
    )
}

fn owner(subject: &str) -> UserIdentity {
    UserIdentity::new(
        subject.to_owned(),
        "Building Owner".to_owned(),
        None,
        Role::Owner,
    )
}

fn manual_workflow_input(name: &str) -> SaveWorkflowInput {
    SaveWorkflowInput {
        name: name.to_owned(),
        description: None,
        trigger: WorkflowTrigger::Manual,
        actions: vec![WorkflowAction::LogMessage {
            message: "reminder queued".to_owned(),
        }],
        is_enabled: true,
        owner_subject: None,
    }
}

async fn seed_workflow(harness: &Harness, input: SaveWorkflowInput) -> WorkflowRecord {
    let created = harness.service.create_workflow(&admin(), input).await;
    assert!(created.is_ok());
    created.unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn execute_completes_on_first_attempt() {
    let harness = harness(WorkflowExecutionMode::Inline);
    let workflow = seed_workflow(&harness, manual_workflow_input("Late Rent Reminder")).await;

    let execution = harness
        .service
        .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
        .await;
    assert!(execution.is_ok());
    let execution = execution.unwrap_or_else(|_| unreachable!());

    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.retry_count, 0);
    assert!(execution.retry_reason.is_none());
    assert!(execution.result.is_some());

    let attempts = harness.repository.attempts.lock().await;
    assert_eq!(attempts.len(), 1);

    let notifications = harness.notifications.notifications.lock().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].recipient_subject, "staff-1");
    assert_eq!(notifications[0].created_by, "system");
}

#[tokio::test(start_paused = true)]
async fn execute_retries_with_backoff_then_completes() {
    let harness = harness(WorkflowExecutionMode::Inline);
    let workflow = seed_workflow(&harness, manual_workflow_input("Late Rent Reminder")).await;
    *harness.engine.failures_remaining.lock().await = 2;

    let started = tokio::time::Instant::now();
    let execution = harness
        .service
        .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
        .await;
    let elapsed = started.elapsed();

    assert!(execution.is_ok());
    let execution = execution.unwrap_or_else(|_| unreachable!());
    assert_eq!(execution.status, ExecutionStatus::Completed);
    assert_eq!(execution.retry_count, 2);
    assert!(execution.retry_reason.is_some());

    // Two failed attempts wait 2s then 4s before the third succeeds.
    assert!(elapsed >= Duration::from_secs(6));

    let attempts = harness.repository.attempts.lock().await;
    assert_eq!(attempts.len(), 3);

    // Intermediate failures are not announced; only the terminal outcome is.
    let notifications = harness.notifications.notifications.lock().await;
    assert_eq!(notifications.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn execute_fails_after_retry_exhaustion() {
    let harness = harness(WorkflowExecutionMode::Inline);
    let workflow = seed_workflow(&harness, manual_workflow_input("Late Rent Reminder")).await;
    *harness.engine.failures_remaining.lock().await = 3;

    let execution = harness
        .service
        .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
        .await;
    assert!(execution.is_ok());
    let execution = execution.unwrap_or_else(|_| unreachable!());

    assert_eq!(execution.status, ExecutionStatus::Failed);
    assert_eq!(execution.retry_count, 3);
    assert_eq!(
        execution.retry_reason.as_deref(),
        Some("simulated workflow action failure")
    );
    assert_eq!(execution.duration_ms, Some(0));

    let executions = harness.repository.executions.lock().await;
    assert_eq!(executions.len(), 1);

    let attempts = harness.repository.attempts.lock().await;
    assert_eq!(attempts.len(), 3);

    let notifications = harness.notifications.notifications.lock().await;
    assert_eq!(notifications.len(), 1);
}

#[tokio::test]
async fn execute_rejects_disabled_workflow() {
    let harness = harness(WorkflowExecutionMode::Inline);
    let mut input = manual_workflow_input("Paused Reminder");
    input.is_enabled = false;
    let workflow = seed_workflow(&harness, input).await;

    let result = harness
        .service
        .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn execute_rejects_unknown_workflow() {
    let harness = harness(WorkflowExecutionMode::Inline);

    let result = harness
        .service
        .execute_workflow(&staff(), "wf-missing", json!({}))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn foreign_owner_workflow_surfaces_as_not_found() {
    let harness = harness(WorkflowExecutionMode::Inline);
    let mut input = manual_workflow_input("Owner Digest");
    input.owner_subject = Some("owner-1".to_owned());
    let workflow = seed_workflow(&harness, input).await;

    let result = harness
        .service
        .get_workflow(&owner("owner-2"), workflow.workflow_id.as_str())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let visible = harness.service.list_workflows(&owner("owner-2")).await;
    assert_eq!(visible.map(|list| list.len()).ok(), Some(0));
}

#[tokio::test]
async fn execute_and_history_require_staff_role() {
    let harness = harness(WorkflowExecutionMode::Inline);
    let mut input = manual_workflow_input("Owner Digest");
    input.owner_subject = Some("owner-1".to_owned());
    let workflow = seed_workflow(&harness, input).await;

    // Even the owning subject cannot trigger or audit executions.
    let execute = harness
        .service
        .execute_workflow(&owner("owner-1"), workflow.workflow_id.as_str(), json!({}))
        .await;
    assert!(matches!(execute, Err(AppError::Forbidden(_))));

    let history = harness
        .service
        .execution_history(
            &owner("owner-1"),
            workflow.workflow_id.as_str(),
            ExecutionHistoryQuery::new(None, None),
        )
        .await;
    assert!(matches!(history, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn concurrent_execution_conflicts_on_running_intent() {
    let harness = harness(WorkflowExecutionMode::Queued);
    let workflow = seed_workflow(&harness, manual_workflow_input("Late Rent Reminder")).await;

    let first = harness
        .service
        .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
        .await;
    assert!(first.is_ok());

    // Queued mode leaves the intent record running, so a second request
    // for the same workflow must conflict.
    let second = harness
        .service
        .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
        .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn stale_running_execution_is_reclaimed_on_next_request() {
    let harness = harness(WorkflowExecutionMode::Inline);
    let workflow = seed_workflow(&harness, manual_workflow_input("Late Rent Reminder")).await;

    // A running row left behind by a crash or a failed terminal write. Once
    // past the staleness bound it must stop blocking new executions.
    let abandoned_started_at =
        Utc::now() - ChronoDuration::seconds(i64::from(STALE_RUNNING_EXECUTION_SECONDS) + 60);
    harness.repository.executions.lock().await.push(WorkflowExecution {
        execution_id: "exec-abandoned".to_owned(),
        workflow_id: workflow.workflow_id.clone(),
        trigger_kind: TriggerKind::Manual,
        trigger_payload: json!({}),
        status: ExecutionStatus::Running,
        retry_count: 0,
        retry_reason: None,
        result: None,
        duration_ms: None,
        triggered_by_subject: "staff-1".to_owned(),
        triggered_by_display_name: "Dana Property Manager".to_owned(),
        started_at: abandoned_started_at,
        finished_at: None,
    });

    let execution = harness
        .service
        .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
        .await;
    assert!(execution.is_ok());
    let execution = execution.unwrap_or_else(|_| unreachable!());
    assert_eq!(execution.status, ExecutionStatus::Completed);

    let executions = harness.repository.executions.lock().await;
    let abandoned = executions
        .iter()
        .find(|execution| execution.execution_id == "exec-abandoned")
        .cloned();
    assert_eq!(
        abandoned.as_ref().map(|execution| execution.status),
        Some(ExecutionStatus::Failed)
    );
    assert!(abandoned.is_some_and(|execution| execution.retry_reason.is_some()));
}

#[tokio::test]
async fn queued_mode_returns_running_intent_and_enqueues_job() {
    let harness = harness(WorkflowExecutionMode::Queued);
    let workflow = seed_workflow(&harness, manual_workflow_input("Late Rent Reminder")).await;

    let execution = harness
        .service
        .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
        .await;
    assert!(execution.is_ok());
    let execution = execution.unwrap_or_else(|_| unreachable!());
    assert_eq!(execution.status, ExecutionStatus::Running);

    let jobs = harness.repository.jobs.lock().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].state, FakeJobState::Pending);
}

#[tokio::test]
async fn claimed_job_runs_to_terminal_and_completes_queue_state() {
    let harness = harness(WorkflowExecutionMode::Queued);
    let workflow = seed_workflow(&harness, manual_workflow_input("Late Rent Reminder")).await;

    let started = harness
        .service
        .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
        .await;
    assert!(started.is_ok());

    let claimed = harness.service.claim_jobs_for_worker("worker-1", 5, 60).await;
    assert!(claimed.is_ok());
    let mut claimed = claimed.unwrap_or_default();
    assert_eq!(claimed.len(), 1);
    let job = claimed.remove(0);

    let completed = harness.service.execute_claimed_job("worker-1", job).await;
    assert!(completed.is_ok());
    let completed = completed.unwrap_or_else(|_| unreachable!());
    assert_eq!(completed.status, ExecutionStatus::Completed);

    let jobs = harness.repository.jobs.lock().await;
    assert_eq!(jobs[0].state, FakeJobState::Done);
}

#[tokio::test]
async fn dispatch_event_starts_matching_enabled_workflows_only() {
    let harness = harness(WorkflowExecutionMode::Inline);

    let mut matching = manual_workflow_input("On Maintenance Request");
    matching.trigger = WorkflowTrigger::Event {
        event_name: "maintenance_request.created".to_owned(),
    };
    seed_workflow(&harness, matching).await;

    let mut disabled = manual_workflow_input("Disabled Listener");
    disabled.trigger = WorkflowTrigger::Event {
        event_name: "maintenance_request.created".to_owned(),
    };
    disabled.is_enabled = false;
    seed_workflow(&harness, disabled).await;

    let mut other_event = manual_workflow_input("On Lease Signed");
    other_event.trigger = WorkflowTrigger::Event {
        event_name: "lease.signed".to_owned(),
    };
    seed_workflow(&harness, other_event).await;

    let started = harness
        .service
        .dispatch_event(&staff(), "maintenance_request.created", json!({"id": 7}))
        .await;
    assert_eq!(started.ok(), Some(1));
}

#[tokio::test]
async fn execution_history_pages_newest_first() {
    let harness = harness(WorkflowExecutionMode::Inline);
    let workflow = seed_workflow(&harness, manual_workflow_input("Late Rent Reminder")).await;

    for _ in 0..3 {
        let execution = harness
            .service
            .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
            .await;
        assert!(execution.is_ok());
    }

    let page = harness
        .service
        .execution_history(
            &staff(),
            workflow.workflow_id.as_str(),
            ExecutionHistoryQuery::new(Some(1), Some(2)),
        )
        .await;
    assert!(page.is_ok());
    let page = page.unwrap_or_else(|_| unreachable!());

    assert_eq!(page.total, 3);
    assert_eq!(page.executions.len(), 2);
    assert!(page.executions[0].started_at >= page.executions[1].started_at);
}

#[tokio::test]
async fn execution_attempts_require_staff_role() {
    let harness = harness(WorkflowExecutionMode::Inline);
    let workflow = seed_workflow(&harness, manual_workflow_input("Late Rent Reminder")).await;

    let execution = harness
        .service
        .execute_workflow(&staff(), workflow.workflow_id.as_str(), json!({}))
        .await;
    assert!(execution.is_ok());
    let execution = execution.unwrap_or_else(|_| unreachable!());

    let attempts = harness
        .service
        .execution_attempts(&staff(), execution.execution_id.as_str())
        .await;
    assert_eq!(attempts.map(|attempts| attempts.len()).ok(), Some(1));

    let denied = harness
        .service
        .execution_attempts(&owner("owner-1"), execution.execution_id.as_str())
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let missing = harness
        .service
        .execution_attempts(&staff(), "exec-missing")
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn only_admins_create_workflows() {
    let harness = harness(WorkflowExecutionMode::Inline);
    let tenant = UserIdentity::new(
        "tenant-1".to_owned(),
        "Tenant".to_owned(),
        None,
        Role::Tenant,
    );

    let result = harness
        .service
        .create_workflow(&tenant, manual_workflow_input("Not Allowed"))
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let staff_result = harness
        .service
        .create_workflow(&staff(), manual_workflow_input("Also Not Allowed"))
        .await;
    assert!(matches!(staff_result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn queue_operations_require_queued_mode() {
    let harness = harness(WorkflowExecutionMode::Inline);

    let claim = harness.service.claim_jobs_for_worker("worker-1", 5, 60).await;
    assert!(matches!(claim, Err(AppError::Conflict(_))));

    let heartbeat = harness
        .service
        .heartbeat_worker(
            "worker-1",
            WorkerHeartbeatInput {
                claimed_jobs: 0,
                executed_jobs: 0,
                failed_jobs: 0,
            },
        )
        .await;
    assert!(matches!(heartbeat, Err(AppError::Conflict(_))));
}
