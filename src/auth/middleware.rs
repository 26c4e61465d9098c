// Authentication gate for protected routes

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::auth::{error::AuthError, token::TokenService};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

/// Build the session cookie for a freshly issued token.
///
/// HttpOnly + SameSite=Lax, max-age matching the token validity; Secure is
/// a deployment decision carried in configuration.
pub fn session_cookie(token: String, ttl_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl_secs))
        .build()
}

/// Authenticated caller, extracted from a bearer header or the session
/// cookie (header takes precedence). The rejection response for a bad token
/// clears the cookie so clients stop replaying it.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_owned);

        let token = match bearer {
            Some(token) => token,
            None => CookieJar::from_headers(&parts.headers)
                .get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .ok_or(AuthError::MissingToken)?,
        };

        let tokens = TokenService::from_ref(state);
        let claims = tokens.verify(&token)?;

        Ok(Self {
            user_id: claims.sub,
        })
    }
}
