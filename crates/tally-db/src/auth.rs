//! # Owner Password Gate
//!
//! Argon2 verification of the owner password re-entered for destructive
//! operations (soft delete, restore, purge).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DELETE /products/{id}  {password}                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SoftDeleteArchive::soft_delete                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OwnerPasswordGate::verify  ── users.password_hash (argon2 PHC)        │
//! │       │                                                                 │
//! │       ├── blank    → PasswordRequired                                  │
//! │       ├── mismatch → IncorrectPassword                                 │
//! │       └── ok       → proceed                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use tracing::warn;

use crate::archive::PasswordGate;
use crate::error::{DbError, DbResult};
use crate::repository::user::UserRepository;

/// Hashes a password for storage (argon2id, random salt, PHC string).
pub fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC string.
///
/// A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Checks candidates against the owner account in the `users` table.
#[derive(Debug, Clone)]
pub struct OwnerPasswordGate {
    users: UserRepository,
    username: String,
}

impl OwnerPasswordGate {
    pub fn new(users: UserRepository, username: impl Into<String>) -> Self {
        OwnerPasswordGate {
            users,
            username: username.into(),
        }
    }
}

#[async_trait]
impl PasswordGate for OwnerPasswordGate {
    async fn verify(&self, candidate: &str) -> DbResult<bool> {
        let Some(owner) = self.users.find_by_username(&self.username).await? else {
            warn!(username = %self.username, "No owner account; destructive operations are locked");
            return Ok(false);
        };

        let candidate = candidate.to_string();
        let hash = owner.password_hash;
        // Argon2 is CPU-bound; run it off the async workers.
        tokio::task::spawn_blocking(move || verify_password(&candidate, &hash))
            .await
            .map_err(|e| DbError::Internal(format!("password check aborted: {}", e)))
    }
}
