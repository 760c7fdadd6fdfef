//! SMTP email delivery over `lettre`.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rentfold_application::EmailService;
use rentfold_core::{AppError, AppResult};

/// Connection settings for the SMTP relay.
#[derive(Clone)]
pub struct SmtpEmailConfig {
    /// Relay hostname.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Relay username.
    pub username: String,
    /// Relay password.
    pub password: String,
    /// Sender address, e.g. `Rentfold <noreply@rentfold.example>`.
    pub from_address: String,
}

/// Email service delivering through an SMTP relay.
///
/// The transport and sender mailbox are validated once at construction, so
/// a misconfigured relay fails at startup instead of on the first workflow
/// that sends mail.
#[derive(Clone)]
pub struct SmtpEmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailService {
    /// Builds the relay transport from the configuration.
    pub fn new(config: SmtpEmailConfig) -> AppResult<Self> {
        let from = config.from_address.parse::<Mailbox>().map_err(|error| {
            AppError::Validation(format!(
                "invalid SMTP sender address '{}': {error}",
                config.from_address
            ))
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(config.host.as_str())
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to create SMTP transport for '{}': {error}",
                    config.host
                ))
            })?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let recipient = to.parse::<Mailbox>().map_err(|error| {
            AppError::Validation(format!("invalid recipient address '{to}': {error}"))
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_owned())
            .map_err(|error| AppError::Internal(format!("failed to build email: {error}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|error| AppError::Internal(format!("failed to send email to '{to}': {error}")))?;

        Ok(())
    }
}
