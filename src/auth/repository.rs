// Postgres adapters for the credential store ports

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::models::{NewUser, User};
use crate::auth::store::{OtpStore, StoreError, UserStore};

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

const USER_COLUMNS: &str =
    "id, email, password_hash, username, profile_pic_url, is_verified, role, created_at, updated_at";

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;
        Ok(exists.0)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        // The unique index on email is the authority for the duplicate rule;
        // concurrent registrations race down to a single winner here.
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, username, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.username)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                backend(e)
            }
        })
    }

    async fn delete_unverified(&self, email: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users WHERE email = $1 AND NOT is_verified")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

pub struct PostgresOtpStore {
    pool: PgPool,
}

impl PostgresOtpStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OtpStore for PostgresOtpStore {
    async fn issue(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // Retire stale rows, then insert. The partial unique index on
        // (email) WHERE NOT used turns a concurrent double-issue into a
        // unique violation instead of a second active code.
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "UPDATE otp_tokens SET used = TRUE
             WHERE email = $1 AND NOT used AND expires_at <= NOW()",
        )
        .bind(email)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        sqlx::query("INSERT INTO otp_tokens (email, code, expires_at) VALUES ($1, $2, $3)")
            .bind(email)
            .bind(code)
            .bind(expires_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::ActiveCodeExists
                } else {
                    backend(e)
                }
            })?;

        tx.commit().await.map_err(backend)
    }

    async fn consume(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // Single conditional update: match-and-mark in one statement so a
        // code can never be consumed twice.
        let result = sqlx::query(
            "UPDATE otp_tokens SET used = TRUE
             WHERE email = $1 AND code = $2 AND NOT used AND expires_at > $3",
        )
        .bind(email)
        .bind(code)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn retire_all(&self, email: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE otp_tokens SET used = TRUE WHERE email = $1 AND NOT used")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
