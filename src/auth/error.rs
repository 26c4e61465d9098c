// Authentication error types

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use tracing::{error, warn};

use crate::auth::store::StoreError;

/// Errors produced by the authentication flow
///
/// Each variant maps to one HTTP status and a stable error body. Messages for
/// credential and OTP failures are deliberately generic so the API does not
/// reveal whether an email is registered or why a code was rejected.
#[derive(Debug)]
pub enum AuthError {
    ValidationError(String),
    DuplicateEmail,
    InvalidCredentials,
    EmailNotVerified,
    OtpAlreadyActive,
    OtpDispatchFailed(String),
    OtpMissing,
    InvalidOrExpiredOtp,
    AlreadyVerified,
    UserNotFound,
    MissingToken,
    InvalidToken,
    ExpiredToken,
    PasswordHashError,
    TokenGenerationError(String),
    StoreError(String),
    InternalError(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AuthError::DuplicateEmail => write!(f, "Email already in use"),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::EmailNotVerified => write!(f, "Email not verified"),
            AuthError::OtpAlreadyActive => write!(f, "Please wait to resend OTP"),
            AuthError::OtpDispatchFailed(msg) => write!(f, "OTP dispatch failed: {}", msg),
            AuthError::OtpMissing => write!(f, "OTP is required"),
            AuthError::InvalidOrExpiredOtp => write!(f, "Invalid or expired OTP"),
            AuthError::AlreadyVerified => write!(f, "Email already verified"),
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::MissingToken => write!(f, "Unauthorized"),
            AuthError::InvalidToken => write!(f, "Invalid or expired token"),
            AuthError::ExpiredToken => write!(f, "Invalid or expired token"),
            AuthError::PasswordHashError => write!(f, "Password hashing error"),
            AuthError::TokenGenerationError(msg) => write!(f, "Token generation error: {}", msg),
            AuthError::StoreError(msg) => write!(f, "Store error: {}", msg),
            AuthError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            StoreError::ActiveCodeExists => AuthError::OtpAlreadyActive,
            StoreError::Backend(msg) => AuthError::StoreError(msg),
        }
    }
}

/// Removal cookie sent alongside 401 responses for bad session tokens, so
/// clients do not keep replaying a stale cookie.
fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateEmail => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
            AuthError::OtpAlreadyActive => StatusCode::BAD_REQUEST,
            AuthError::OtpDispatchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::OtpMissing => StatusCode::BAD_REQUEST,
            AuthError::InvalidOrExpiredOtp => StatusCode::BAD_REQUEST,
            AuthError::AlreadyVerified => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AuthError::PasswordHashError => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; never contains backend detail
    fn client_message(&self) -> &'static str {
        match self {
            AuthError::ValidationError(_) => "Invalid request",
            AuthError::DuplicateEmail => "Email already in use",
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::EmailNotVerified => "Email not verified",
            AuthError::OtpAlreadyActive => "Please wait to resend OTP",
            AuthError::OtpDispatchFailed(_) => "Could not send verification email",
            AuthError::OtpMissing => "OTP is required",
            AuthError::InvalidOrExpiredOtp => "Invalid or expired OTP",
            AuthError::AlreadyVerified => "Email already verified",
            AuthError::UserNotFound => "User not found",
            AuthError::MissingToken => "Unauthorized",
            AuthError::InvalidToken => "Invalid or expired token",
            AuthError::ExpiredToken => "Invalid or expired token",
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::StoreError(_)
            | AuthError::InternalError(_) => "Internal server error",
        }
    }

    /// Whether the 401 response should also clear the session cookie
    fn clears_cookie(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::ExpiredToken)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::ValidationError(msg) => warn!("Validation failed: {}", msg),
            AuthError::InvalidToken | AuthError::ExpiredToken => {
                warn!("Rejected session token")
            }
            AuthError::OtpDispatchFailed(msg) => error!("OTP dispatch failed: {}", msg),
            AuthError::PasswordHashError => error!("Password hashing error"),
            AuthError::TokenGenerationError(msg) => error!("Token generation error: {}", msg),
            AuthError::StoreError(msg) => error!("Store error in auth: {}", msg),
            AuthError::InternalError(msg) => error!("Internal error in auth: {}", msg),
            _ => {}
        }

        let status = self.status_code();
        let body = Json(json!({ "error": self.client_message() }));
        let mut response = (status, body).into_response();

        if self.clears_cookie() {
            response
                .headers_mut()
                .append(header::SET_COOKIE, clear_session_cookie());
        }

        response
    }
}
