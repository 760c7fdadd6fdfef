//! Rentfold API composition root.

#![forbid(unsafe_code)]

mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use rentfold_application::{
    AuthorizationService, EmailService, NotificationService, UserService, WorkflowExecutionMode,
    WorkflowService,
};
use rentfold_core::AppError;
use rentfold_infrastructure::{
    Argon2PasswordHasher, ConsoleEmailService, HttpWebhookDispatcher,
    PostgresNotificationRepository, PostgresUserRepository, PostgresWorkflowRepository,
    SmtpEmailConfig, SmtpEmailService, StepWorkflowEngine,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let bootstrap_token = required_non_empty_env("AUTH_BOOTSTRAP_TOKEN")?;

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .unwrap_or_else(|_| "false".to_owned())
        .eq_ignore_ascii_case("true");

    let execution_mode = match env::var("WORKFLOW_EXECUTION_MODE")
        .unwrap_or_else(|_| "inline".to_owned())
        .as_str()
    {
        "inline" => WorkflowExecutionMode::Inline,
        "queued" => WorkflowExecutionMode::Queued,
        other => {
            return Err(AppError::Validation(format!(
                "invalid WORKFLOW_EXECUTION_MODE '{other}': expected 'inline' or 'queued'"
            )));
        }
    };

    let email_provider = env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "console".to_owned());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let session_store = PostgresStore::new(pool.clone());
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let user_repository = Arc::new(PostgresUserRepository::new(pool.clone()));
    let password_hasher = Arc::new(Argon2PasswordHasher::new());
    let user_service = UserService::new(user_repository, password_hasher);

    let email_service: Arc<dyn EmailService> = match email_provider.as_str() {
        "smtp" => Arc::new(SmtpEmailService::new(SmtpEmailConfig {
            host: required_non_empty_env("SMTP_HOST")?,
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(587),
            username: required_env("SMTP_USERNAME")?,
            password: required_env("SMTP_PASSWORD")?,
            from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
        })?),
        "console" => Arc::new(ConsoleEmailService::new()),
        other => {
            return Err(AppError::Validation(format!(
                "invalid EMAIL_PROVIDER '{other}': expected 'console' or 'smtp'"
            )));
        }
    };

    let notification_repository = Arc::new(PostgresNotificationRepository::new(pool.clone()));
    let notification_service = NotificationService::new(notification_repository.clone());

    let webhook_dispatcher = Arc::new(HttpWebhookDispatcher::new(reqwest_client()?));
    let engine = Arc::new(StepWorkflowEngine::new(
        email_service,
        notification_repository.clone(),
        webhook_dispatcher,
    ));

    let workflow_repository = Arc::new(PostgresWorkflowRepository::new(pool.clone()));
    let workflow_service = WorkflowService::new(
        AuthorizationService::new(),
        workflow_repository,
        engine,
        notification_repository,
        execution_mode,
    );

    let app_state = AppState {
        user_service,
        workflow_service,
        notification_service,
        frontend_url: frontend_url.clone(),
        bootstrap_token,
    };

    let protected_routes = Router::new()
        .route(
            "/api/workflows",
            get(handlers::workflows::list_workflows_handler)
                .post(handlers::workflows::create_workflow_handler),
        )
        .route(
            "/api/workflows/dispatch-event",
            post(handlers::workflows::dispatch_event_handler),
        )
        .route(
            "/api/workflows/{workflow_id}",
            get(handlers::workflows::get_workflow_handler),
        )
        .route(
            "/api/workflows/{workflow_id}/execute",
            post(handlers::workflows::execute_workflow_handler),
        )
        .route(
            "/api/workflows/{workflow_id}/executions",
            get(handlers::workflows::execution_history_handler),
        )
        .route(
            "/api/executions/{execution_id}/attempts",
            get(handlers::workflows::execution_attempts_handler),
        )
        .route(
            "/api/notifications",
            get(handlers::notifications::list_notifications_handler),
        )
        .route(
            "/api/notifications/{notification_id}/read",
            post(handlers::notifications::mark_notification_read_handler),
        )
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_same_origin_for_mutations,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "rentfold-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn reqwest_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build http client: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
