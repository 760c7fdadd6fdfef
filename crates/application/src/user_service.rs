use std::sync::Arc;

use rentfold_core::{AppError, AppResult, Role, UserIdentity};

use crate::user_ports::{NewUserAccount, PasswordHasher, UserAccount, UserRepository};

const MIN_PASSWORD_LENGTH: usize = 12;

/// Application service for account bootstrap and credential checks.
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    /// Creates a user service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            repository,
            password_hasher,
        }
    }

    /// Creates the first admin account.
    ///
    /// Only works while no account exists, so the endpoint cannot be used
    /// to escalate after installation.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
    ) -> AppResult<UserIdentity> {
        if self.repository.count().await? > 0 {
            return Err(AppError::Conflict(
                "an account already exists; bootstrap is closed".to_owned(),
            ));
        }

        validate_email(email)?;
        validate_display_name(display_name)?;
        validate_password(password)?;

        let account = self
            .repository
            .create(NewUserAccount {
                email: email.trim().to_lowercase(),
                display_name: display_name.trim().to_owned(),
                password_hash: self.password_hasher.hash(password)?,
                role: Role::Admin,
            })
            .await?;

        Ok(identity_for(&account))
    }

    /// Verifies credentials and returns the authenticated identity.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<UserIdentity> {
        let account = self
            .repository
            .find_by_email(email.trim().to_lowercase().as_str())
            .await?
            .ok_or_else(invalid_credentials)?;

        if !self
            .password_hasher
            .verify(password, account.password_hash.as_str())?
        {
            return Err(invalid_credentials());
        }

        Ok(identity_for(&account))
    }

    /// Resolves a session subject back to an identity.
    pub async fn find_identity(&self, subject: &str) -> AppResult<UserIdentity> {
        let account = self
            .repository
            .find_by_subject(subject)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized("session account no longer exists".to_owned())
            })?;

        Ok(identity_for(&account))
    }
}

fn identity_for(account: &UserAccount) -> UserIdentity {
    UserIdentity::new(
        account.subject.clone(),
        account.display_name.clone(),
        Some(account.email.clone()),
        account.role,
    )
}

fn invalid_credentials() -> AppError {
    // Same message for unknown email and wrong password.
    AppError::Unauthorized("invalid credentials".to_owned())
}

fn validate_email(email: &str) -> AppResult<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(AppError::Validation(
            "email must be a valid address".to_owned(),
        ));
    }

    Ok(())
}

fn validate_display_name(display_name: &str) -> AppResult<()> {
    if display_name.trim().is_empty() {
        return Err(AppError::Validation(
            "display_name must not be empty".to_owned(),
        ));
    }

    Ok(())
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}
