// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// User roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// User database model
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub username: String,
    pub profile_pic_url: String,
    pub is_verified: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user row; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub username: String,
    pub role: Role,
}

/// One-time passcode database model
#[derive(Debug, Clone, FromRow)]
pub struct OtpToken {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration request DTO
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub username: Option<String>,
}

/// Login request DTO
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// OTP verification request DTO
///
/// The code is taken as a raw JSON value so a non-string `otp` reads as
/// missing instead of failing deserialization.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub otp: Option<serde_json::Value>,
}

impl VerifyOtpRequest {
    /// The submitted code, when it was actually a string
    pub fn code(self) -> Option<String> {
        match self.otp {
            Some(serde_json::Value::String(code)) => Some(code),
            _ => None,
        }
    }
}

/// Response for register and login; the token is echoed in the body for
/// clients that do not use the cookie
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: String,
    pub username: String,
    pub token: String,
}

/// Simple message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Safe projection of the current user (excludes the password hash)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub email: String,
    pub username: String,
    pub profile_pic_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            username: user.username,
            profile_pic_url: user.profile_pic_url,
            created_at: user.created_at,
        }
    }
}
