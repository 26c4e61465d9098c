// Credential store ports
//
// The auth flow only needs point lookups and conditional writes, so the
// store is a thin trait pair with a Postgres adapter (repository.rs) and an
// in-memory adapter used by tests (memory.rs).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::models::{NewUser, User};

/// Errors surfaced by the credential store adapters
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A verified or concurrent registration already owns this email
    #[error("email already in use")]
    DuplicateEmail,
    /// An unused, unexpired code already exists for this email
    #[error("an active code already exists")]
    ActiveCodeExists,
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Persistence port for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError>;

    /// Insert a user; relies on the store's email uniqueness primitive and
    /// returns `DuplicateEmail` when another row already holds the email.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Delete the row for `email` only if it is still unverified
    async fn delete_unverified(&self, email: &str) -> Result<(), StoreError>;

    async fn mark_verified(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Persistence port for OTP records
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Insert a fresh code for `email`.
    ///
    /// Expired-but-unused rows are retired first; an unexpired unused row
    /// makes the insert fail with `ActiveCodeExists`. The one-active-code
    /// rule rests on the store's conditional-write primitive, not on a
    /// read-then-write in the caller.
    async fn issue(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Mark the matching unused, unexpired code as used.
    ///
    /// Returns true when exactly one row matched. A consumed code never
    /// matches again, which is what makes verification single-use.
    async fn consume(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Retire every unused code for `email`, regardless of expiry.
    /// Used when an unverified registration is replaced.
    async fn retire_all(&self, email: &str) -> Result<(), StoreError>;
}
