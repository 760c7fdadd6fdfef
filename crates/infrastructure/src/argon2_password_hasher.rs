//! Argon2id credential hashing.

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordVerifier, Version};
use rentfold_application::PasswordHasher;
use rentfold_core::{AppError, AppResult};

/// Password hasher producing PHC-formatted Argon2id hashes.
#[derive(Clone, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    /// Memory cost in KiB (19 MiB, OWASP password-storage baseline).
    const MEMORY_KIB: u32 = 19_456;
    /// Iteration count.
    const ITERATIONS: u32 = 2;
    /// Lane count.
    const PARALLELISM: u32 = 1;

    /// Creates an Argon2id hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn argon2() -> Argon2<'static> {
        let params = Params::new(Self::MEMORY_KIB, Self::ITERATIONS, Self::PARALLELISM, None)
            .unwrap_or_else(|_| Params::default());

        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        argon2::PasswordHasher::hash_password(&Self::argon2(), password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|error| AppError::Internal(format!("failed to hash password: {error}")))
    }

    fn verify(&self, password: &str, password_hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(password_hash).map_err(|error| {
            AppError::Internal(format!("failed to parse password hash: {error}"))
        })?;

        match Self::argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }
}
