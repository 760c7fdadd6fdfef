//! Rentfold workflow worker runtime.
//!
//! Polls the execution job queue, runs each claimed job through the same
//! retry orchestrator the API uses in inline mode, and publishes heartbeat
//! counters.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use rentfold_application::{
    AuthorizationService, EmailService, WorkerHeartbeatInput, WorkflowExecutionMode,
    WorkflowService,
};
use rentfold_core::{AppError, AppResult};
use rentfold_infrastructure::{
    ConsoleEmailService, HttpWebhookDispatcher, PostgresNotificationRepository,
    PostgresWorkflowRepository, SmtpEmailConfig, SmtpEmailService, StepWorkflowEngine,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    worker_id: String,
    claim_limit: u32,
    lease_seconds: u32,
    poll_interval_ms: u64,
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Validation("DATABASE_URL is required".to_owned()))?;

        let worker_id = env::var("WORKER_ID")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| format!("worker-{}", uuid::Uuid::new_v4()));

        let claim_limit = parsed_env("WORKER_CLAIM_LIMIT", 5_u32)?;
        if claim_limit == 0 {
            return Err(AppError::Validation(
                "WORKER_CLAIM_LIMIT must be greater than zero".to_owned(),
            ));
        }

        let lease_seconds = parsed_env("WORKER_LEASE_SECONDS", 60_u32)?;
        if lease_seconds == 0 {
            return Err(AppError::Validation(
                "WORKER_LEASE_SECONDS must be greater than zero".to_owned(),
            ));
        }

        let poll_interval_ms = parsed_env("WORKER_POLL_INTERVAL_MS", 1_000_u64)?;
        if poll_interval_ms == 0 {
            return Err(AppError::Validation(
                "WORKER_POLL_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            worker_id,
            claim_limit,
            lease_seconds,
            poll_interval_ms,
        })
    }
}

fn parsed_env<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| AppError::Validation(format!("invalid {name} '{value}'"))),
        Err(_) => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let workflow_service = build_workflow_service(pool)?;

    info!(
        worker_id = %config.worker_id,
        claim_limit = config.claim_limit,
        lease_seconds = config.lease_seconds,
        poll_interval_ms = config.poll_interval_ms,
        "rentfold-worker started"
    );

    loop {
        let claimed_jobs = match workflow_service
            .claim_jobs_for_worker(
                config.worker_id.as_str(),
                config.claim_limit,
                config.lease_seconds,
            )
            .await
        {
            Ok(jobs) => jobs,
            Err(error) => {
                warn!(
                    worker_id = %config.worker_id,
                    error = %error,
                    "failed to claim execution jobs"
                );
                tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
                continue;
            }
        };

        if claimed_jobs.is_empty() {
            publish_heartbeat(&workflow_service, &config, 0, 0, 0).await;
            tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
            continue;
        }

        let claimed_count = u32::try_from(claimed_jobs.len()).unwrap_or(u32::MAX);
        let mut executed_jobs = 0_u32;
        let mut failed_jobs = 0_u32;

        info!(
            worker_id = %config.worker_id,
            claimed_count,
            "claimed execution jobs"
        );

        for job in claimed_jobs {
            let job_id = job.job_id.clone();
            let execution_id = job.execution_id.clone();

            match workflow_service
                .execute_claimed_job(config.worker_id.as_str(), job)
                .await
            {
                Ok(execution) => {
                    executed_jobs = executed_jobs.saturating_add(1);
                    info!(
                        worker_id = %config.worker_id,
                        job_id = %job_id,
                        execution_id = %execution_id,
                        status = %execution.status.as_str(),
                        retry_count = execution.retry_count,
                        "execution job finished"
                    );
                }
                Err(error) => {
                    failed_jobs = failed_jobs.saturating_add(1);
                    warn!(
                        worker_id = %config.worker_id,
                        job_id = %job_id,
                        execution_id = %execution_id,
                        error = %error,
                        "execution job failed"
                    );
                }
            }
        }

        publish_heartbeat(
            &workflow_service,
            &config,
            claimed_count,
            executed_jobs,
            failed_jobs,
        )
        .await;
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_workflow_service(pool: PgPool) -> AppResult<WorkflowService> {
    let notification_repository = Arc::new(PostgresNotificationRepository::new(pool.clone()));
    let workflow_repository = Arc::new(PostgresWorkflowRepository::new(pool));

    let email_provider = env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "console".to_owned());
    let email_service: Arc<dyn EmailService> = match email_provider.as_str() {
        "smtp" => Arc::new(SmtpEmailService::new(SmtpEmailConfig {
            host: required_env("SMTP_HOST")?,
            port: parsed_env("SMTP_PORT", 587_u16)?,
            username: required_env("SMTP_USERNAME")?,
            password: required_env("SMTP_PASSWORD")?,
            from_address: required_env("SMTP_FROM_ADDRESS")?,
        })?),
        "console" => Arc::new(ConsoleEmailService::new()),
        other => {
            return Err(AppError::Validation(format!(
                "invalid EMAIL_PROVIDER '{other}': expected 'console' or 'smtp'"
            )));
        }
    };

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))?;
    let webhook_dispatcher = Arc::new(HttpWebhookDispatcher::new(http_client));

    let engine = Arc::new(StepWorkflowEngine::new(
        email_service,
        notification_repository.clone(),
        webhook_dispatcher,
    ));

    Ok(WorkflowService::new(
        AuthorizationService::new(),
        workflow_repository,
        engine,
        notification_repository,
        WorkflowExecutionMode::Queued,
    ))
}

async fn publish_heartbeat(
    workflow_service: &WorkflowService,
    config: &WorkerConfig,
    claimed_jobs: u32,
    executed_jobs: u32,
    failed_jobs: u32,
) {
    let heartbeat = workflow_service
        .heartbeat_worker(
            config.worker_id.as_str(),
            WorkerHeartbeatInput {
                claimed_jobs,
                executed_jobs,
                failed_jobs,
            },
        )
        .await;

    if let Err(error) = heartbeat {
        warn!(
            worker_id = %config.worker_id,
            error = %error,
            "failed to publish worker heartbeat"
        );
    }
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
