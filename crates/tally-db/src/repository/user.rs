//! # User Repository
//!
//! Owner credentials. Only the argon2 PHC string is stored.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::error::{DbError, DbResult};
use tally_core::validation::validate_name;

/// A stored credential row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Creates the owner account, or replaces its password if it exists.
    pub async fn upsert_owner(&self, username: &str, password: &str) -> DbResult<User> {
        let username = validate_name(username)?;
        let hash = hash_password(password)?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, 'owner', ?4)
            ON CONFLICT (username) DO UPDATE SET password_hash = excluded.password_hash
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&username)
        .bind(&hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(username = %username, "Owner credentials stored");

        self.find_by_username(&username)
            .await?
            .ok_or_else(|| DbError::not_found("User", &username))
    }
}
