// OTP generation and dispatch (shared by registration and resend)

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::warn;

use crate::auth::{error::AuthError, mailer::Mailer, store::OtpStore};

/// Minutes a code stays valid; the email body quotes this same value
pub const OTP_TTL_MINUTES: i64 = 5;

/// Generate a 6-digit code, uniformly drawn.
///
/// Codes only need to be unique per email at a time, so cross-email
/// collisions are fine.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

/// Issues codes and hands them to the delivery channel
pub struct OtpDispatcher {
    store: Arc<dyn OtpStore>,
    mailer: Arc<dyn Mailer>,
}

impl OtpDispatcher {
    pub fn new(store: Arc<dyn OtpStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Issue a fresh code to `email` and send it.
    ///
    /// Fails with `OtpAlreadyActive` while an unexpired unused code exists.
    /// A delivery failure is reported up but the stored code is kept: it is
    /// still valid, and resend is the designed recovery path.
    pub async fn issue(&self, email: &str) -> Result<(), AuthError> {
        let code = generate_code();
        let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

        self.store.issue(email, &code, expires_at).await?;

        if let Err(e) = self.mailer.send_otp(email, &code).await {
            warn!("OTP stored but email dispatch failed for {}: {}", email, e);
            return Err(AuthError::OtpDispatchFailed(e.to_string()));
        }

        Ok(())
    }

    /// Consume the matching active code; true when one matched
    pub async fn consume(&self, email: &str, code: &str) -> Result<bool, AuthError> {
        Ok(self.store.consume(email, code, Utc::now()).await?)
    }

    /// Retire every outstanding code for `email`
    pub async fn retire_all(&self, email: &str) -> Result<(), AuthError> {
        Ok(self.store.retire_all(email).await?)
    }
}
