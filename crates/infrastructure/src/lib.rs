//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod console_email_service;
mod http_webhook_dispatcher;
mod postgres_notification_repository;
mod postgres_user_repository;
mod postgres_workflow_repository;
mod smtp_email_service;
mod step_workflow_engine;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use console_email_service::ConsoleEmailService;
pub use http_webhook_dispatcher::HttpWebhookDispatcher;
pub use postgres_notification_repository::PostgresNotificationRepository;
pub use postgres_user_repository::PostgresUserRepository;
pub use postgres_workflow_repository::PostgresWorkflowRepository;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
pub use step_workflow_engine::StepWorkflowEngine;
