use async_trait::async_trait;
use rentfold_core::{AppResult, Role};

/// Persisted user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Stable user identifier.
    pub subject: String,
    /// Login email, unique per account.
    pub email: String,
    /// Display name shown in audit trails.
    pub display_name: String,
    /// Password hash in PHC string format.
    pub password_hash: String,
    /// Assigned role.
    pub role: Role,
}

/// User creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserAccount {
    /// Login email.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Password hash in PHC string format.
    pub password_hash: String,
    /// Assigned role.
    pub role: Role,
}

/// Port for user account persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists one account and returns the stored row.
    ///
    /// Returns `AppError::Conflict` when the email is already registered.
    async fn create(&self, input: NewUserAccount) -> AppResult<UserAccount>;

    /// Returns one account by login email, or `None` when absent.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserAccount>>;

    /// Returns one account by subject, or `None` when absent.
    async fn find_by_subject(&self, subject: &str) -> AppResult<Option<UserAccount>>;

    /// Counts all registered accounts.
    async fn count(&self) -> AppResult<u64>;
}

/// Port for password hashing and verification.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password into PHC string format.
    fn hash(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify(&self, password: &str, password_hash: &str) -> AppResult<bool>;
}
