// Password hashing with Argon2id
//
// Hashing is CPU-bound, so both operations run under spawn_blocking to keep
// the request executor free.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::auth::error::AuthError;

/// Hash a password with a freshly generated salt
pub async fn hash(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHashError)
    })
    .await
    .map_err(|e| AuthError::InternalError(e.to_string()))?
}

/// Verify a password against a stored hash
///
/// Returns false for a mismatch; an unparseable stored hash is an error.
pub async fn verify(password: String, stored_hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash).map_err(|_| AuthError::PasswordHashError)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AuthError::InternalError(e.to_string()))?
}
