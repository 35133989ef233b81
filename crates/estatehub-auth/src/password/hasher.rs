//! Argon2id password hashing and verification.

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use estatehub_core::error::AppError;
use estatehub_core::result::AppResult;

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::hashing(format!("Password hashing failed: {e}")))
    }

    /// Verifies a plaintext password against a stored PHC hash.
    ///
    /// A stored hash that cannot be parsed counts as a mismatch.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
                return false;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Verify against a fixed throwaway hash, for lookups that found no account.
    ///
    /// Costs one Argon2 verification like [`Self::verify_password`]; never
    /// matches a password other than the throwaway one.
    pub fn verify_dummy(&self, password: &str) -> bool {
        static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

        DUMMY_HASH
            .get_or_init(|| self.hash_password(DUMMY_PASSWORD).ok())
            .as_deref()
            .is_some_and(|hash| self.verify_password(password, hash))
    }
}

const DUMMY_PASSWORD: &str = "estatehub-no-such-account";
