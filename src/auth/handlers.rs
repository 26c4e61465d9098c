// HTTP handlers for authentication endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::CookieJar;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    middleware::{session_cookie, AuthenticatedUser},
    models::{
        LoginRequest, MeResponse, MessageResponse, RegisterRequest, SessionResponse,
        VerifyOtpRequest,
    },
    service::AuthService,
};

/// Register a new user
/// POST /api/auth/register
pub async fn register_handler(
    State(service): State<Arc<AuthService>>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>), AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::ValidationError(e.to_string()))?;

    let (user, token) = service
        .register(&request.email, &request.password, request.username)
        .await?;

    let jar = jar.add(session_cookie(
        token.clone(),
        service.token_ttl_secs(),
        service.secure_cookies(),
    ));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(SessionResponse {
            message: "User registered. Check your email for the verification OTP.".to_string(),
            username: user.username,
            token,
        }),
    ))
}

/// Login
/// POST /api/auth/login
pub async fn login_handler(
    State(service): State<Arc<AuthService>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::ValidationError(e.to_string()))?;

    let (user, token) = service.login(&request.email, &request.password).await?;

    let jar = jar.add(session_cookie(
        token.clone(),
        service.token_ttl_secs(),
        service.secure_cookies(),
    ));

    Ok((
        jar,
        Json(SessionResponse {
            message: "Logged in successfully".to_string(),
            username: user.username,
            token,
        }),
    ))
}

/// Current user lookup (protected)
/// GET|POST /api/auth/me
pub async fn me_handler(
    State(service): State<Arc<AuthService>>,
    user: AuthenticatedUser,
) -> Result<Json<MeResponse>, AuthError> {
    let user = service.current_user(user.user_id).await?;
    Ok(Json(user.into()))
}

/// Re-send the verification OTP (protected)
/// POST /api/auth/resend-otp
pub async fn resend_otp_handler(
    State(service): State<Arc<AuthService>>,
    user: AuthenticatedUser,
) -> Result<Json<MessageResponse>, AuthError> {
    service.resend_otp(user.user_id).await?;
    Ok(Json(MessageResponse {
        message: "OTP sent to email.".to_string(),
    }))
}

/// Verify the emailed OTP (protected)
/// POST /api/auth/verify-otp
pub async fn verify_otp_handler(
    State(service): State<Arc<AuthService>>,
    user: AuthenticatedUser,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    service.verify_otp(user.user_id, request.code()).await?;
    Ok(Json(MessageResponse {
        message: "Email verified successfully.".to_string(),
    }))
}
