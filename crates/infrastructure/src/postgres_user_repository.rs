//! PostgreSQL-backed user repository.

use std::str::FromStr;

use async_trait::async_trait;
use rentfold_application::{NewUserAccount, UserAccount, UserRepository};
use rentfold_core::{AppError, AppResult, Role};
use sqlx::{FromRow, PgPool};

/// PostgreSQL implementation of the user repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: uuid::Uuid,
    email: String,
    display_name: String,
    password_hash: String,
    role: String,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, input: NewUserAccount) -> AppResult<UserAccount> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, display_name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, display_name, password_hash, role
            "#,
        )
        .bind(input.email)
        .bind(input.display_name)
        .bind(input.password_hash)
        .bind(input.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(email_conflict_or_internal)?;

        account_from_row(row)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, display_name, password_hash, role
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by email: {error}")))?;

        row.map(account_from_row).transpose()
    }

    async fn find_by_subject(&self, subject: &str) -> AppResult<Option<UserAccount>> {
        let user_uuid = match uuid::Uuid::parse_str(subject) {
            Ok(user_uuid) => user_uuid,
            Err(_) => return Ok(None),
        };

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, display_name, password_hash, role
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_uuid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find user by subject: {error}"))
        })?;

        row.map(account_from_row).transpose()
    }

    async fn count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to count users: {error}")))?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn account_from_row(row: UserRow) -> AppResult<UserAccount> {
    Ok(UserAccount {
        subject: row.id.to_string(),
        email: row.email,
        display_name: row.display_name,
        password_hash: row.password_hash,
        role: Role::from_str(row.role.as_str())?,
    })
}

fn email_conflict_or_internal(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict("an account with this email already exists".to_owned());
    }

    AppError::Internal(format!("failed to create user: {error}"))
}
