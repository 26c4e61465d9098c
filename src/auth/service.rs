// Auth flow controller
//
// Orchestrates registration, login, OTP issuance and verification, and
// current-user lookups over the store/mailer ports.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{NewUser, Role, User},
    otp::OtpDispatcher,
    password,
    store::UserStore,
    token::TokenService,
};

/// Probe ceiling for the username dedup loop; past this the namespace is
/// considered exhausted and registration fails.
const USERNAME_PROBE_LIMIT: u32 = 1000;

/// Emails are ASCII-lowercased at every boundary, so lookups and the store's
/// uniqueness rule are case-insensitive by construction.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    otp: OtpDispatcher,
    tokens: TokenService,
    secure_cookies: bool,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        otp: OtpDispatcher,
        tokens: TokenService,
        secure_cookies: bool,
    ) -> Self {
        Self {
            users,
            otp,
            tokens,
            secure_cookies,
        }
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    pub fn token_ttl_secs(&self) -> i64 {
        self.tokens.ttl_secs()
    }

    /// Register a new account and issue its first OTP.
    ///
    /// A verified account already holding the email is a hard failure; an
    /// unverified one is a reclaimable slot, so its row and outstanding
    /// codes are dropped before the new registration proceeds. The returned
    /// token is valid before verification so the client can reach the
    /// resend/verify endpoints.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        username: Option<String>,
    ) -> Result<(User, String), AuthError> {
        let email = normalize_email(email);

        if let Some(existing) = self.users.find_by_email(&email).await? {
            if existing.is_verified {
                return Err(AuthError::DuplicateEmail);
            }
            self.users.delete_unverified(&email).await?;
            self.otp.retire_all(&email).await?;
        }

        let password_hash = password::hash(password.to_string()).await?;
        let username = match username {
            Some(name) => name,
            None => self.allocate_username(&email).await?,
        };

        let user = self
            .users
            .insert(NewUser {
                email: email.clone(),
                password_hash,
                username,
                role: Role::User,
            })
            .await?;

        info!("Registered user {} ({})", user.username, user.id);

        // The user row stays persisted if dispatch fails; resend-otp is the
        // recovery path for that state.
        self.otp.issue(&email).await?;

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    /// Authenticate email + password and issue a session token.
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller; an unverified account with the right password is not.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = normalize_email(email);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify(password.to_string(), user.password_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    /// Re-issue the verification code for an authenticated, unverified user
    pub async fn resend_otp(&self, user_id: Uuid) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        self.otp.issue(&user.email).await
    }

    /// Verify the submitted code and flip the account to verified.
    ///
    /// The code is consumed before the user flip: a crash in between burns
    /// the code and leaves the user unverified, which resend recovers from.
    /// The reverse order would leave a live code on a verified account.
    pub async fn verify_otp(
        &self,
        user_id: Uuid,
        submitted: Option<String>,
    ) -> Result<(), AuthError> {
        let code = submitted
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::OtpMissing)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        // Wrong, expired, and already-used codes all look the same from
        // the outside.
        if !self.otp.consume(&user.email, &code).await? {
            return Err(AuthError::InvalidOrExpiredOtp);
        }

        self.users.mark_verified(user.id).await?;
        info!("Verified user {}", user.id);
        Ok(())
    }

    /// Load the authenticated user; the row may be gone if the account was
    /// deleted after the token was issued.
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Derive a username from the email local part, probing the store for a
    /// free value: base, base1, base2, ...
    async fn allocate_username(&self, email: &str) -> Result<String, AuthError> {
        let base = email
            .split('@')
            .next()
            .unwrap_or(email)
            .to_ascii_lowercase();

        for counter in 0..USERNAME_PROBE_LIMIT {
            let candidate = if counter == 0 {
                base.clone()
            } else {
                format!("{}{}", base, counter)
            };
            if !self.users.username_exists(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(AuthError::InternalError(format!(
            "no free username within {} probes of '{}'",
            USERNAME_PROBE_LIMIT, base
        )))
    }
}
