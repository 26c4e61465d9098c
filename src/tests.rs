// Handler tests for the marketplace API
// Run entirely over the in-memory store and mailer adapters

use super::*;
use crate::auth::memory::{InMemoryOtpStore, InMemoryUserStore, RecordingMailer};
use crate::auth::token::Claims;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::types::Json as Jsonb;
use uuid::Uuid;

// ============================================================================
// Test Helpers
// ============================================================================

const TEST_SECRET: &str = "handler_test_secret";

struct TestApp {
    server: TestServer,
    mailer: Arc<RecordingMailer>,
    tokens: TokenService,
}

fn sample_projects() -> Vec<Project> {
    let info = projects::models::ProjectInfo {
        author: "hmmbo".to_string(),
        total_downloads: 1200,
        first_release: Utc::now(),
        last_update: Utc::now(),
        status: projects::models::ProjectStatus::Premium,
        rating: "5".to_string(),
        total_ratings: 40,
    };

    vec![
        Project {
            id: "prison-core".to_string(),
            title: "Prison Core".to_string(),
            price: 14.99,
            discord_link: "https://discord.gg/example".to_string(),
            donation_link: String::new(),
            description: "All-in-one prison setup".to_string(),
            image_url: "https://cdn.example.com/prison.png".to_string(),
            category: "setups".to_string(),
            updates: Jsonb(vec![]),
            comments: Jsonb(vec![]),
            versions: Jsonb(vec![]),
            project_info: Jsonb(info.clone()),
        },
        Project {
            id: "skyblock-core".to_string(),
            title: "Skyblock Core".to_string(),
            price: 9.99,
            discord_link: String::new(),
            donation_link: String::new(),
            description: "Skyblock starter".to_string(),
            image_url: String::new(),
            category: "setups".to_string(),
            updates: Jsonb(vec![]),
            comments: Jsonb(vec![]),
            versions: Jsonb(vec![]),
            project_info: Jsonb(info),
        },
    ]
}

/// Build a test app over in-memory stores
fn create_test_app() -> TestApp {
    let mailer = Arc::new(RecordingMailer::new());
    let tokens = TokenService::new(TEST_SECRET.to_string());

    let auth = AuthService::new(
        Arc::new(InMemoryUserStore::new()),
        OtpDispatcher::new(Arc::new(InMemoryOtpStore::new()), mailer.clone()),
        tokens.clone(),
        false,
    );

    let state = AppState {
        auth: Arc::new(auth),
        projects: Arc::new(projects::InMemoryProjectStore::new(sample_projects())),
        tokens: tokens.clone(),
    };

    TestApp {
        server: TestServer::new(create_router(state)).unwrap(),
        mailer,
        tokens,
    }
}

fn register_payload(email: &str) -> Value {
    json!({ "email": email, "password": "password123" })
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

/// Register an account and return its session token
async fn register(app: &TestApp, email: &str) -> String {
    let response = app
        .server
        .post("/api/auth/register")
        .json(&register_payload(email))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

/// Register and verify an account, returning its session token
async fn register_verified(app: &TestApp, email: &str) -> String {
    let token = register(app, email).await;
    // The mailer records sends under the normalized address
    let code = app
        .mailer
        .last_code_for(&auth::service::normalize_email(email))
        .unwrap();
    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/auth/verify-otp")
        .add_header(name, value)
        .json(&json!({ "otp": code }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    token
}

fn set_cookie_headers(response: &axum_test::TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_returns_created_with_token_and_cookie() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/auth/register")
        .json(&register_payload("new@example.com"))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["username"], "new");
    assert!(body["token"].as_str().is_some());

    let cookies = set_cookie_headers(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("token="));
    assert!(cookies[0].contains("HttpOnly"));
    assert!(cookies[0].contains("SameSite=Lax"));

    // One OTP went out to the registrant
    assert_eq!(app.mailer.sent().len(), 1);
    assert_eq!(app.mailer.sent()[0].0, "new@example.com");
}

#[tokio::test]
async fn test_register_verified_email_twice_is_a_duplicate() {
    let app = create_test_app();
    register_verified(&app, "taken@example.com").await;

    let response = app
        .server
        .post("/api/auth/register")
        .json(&register_payload("taken@example.com"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Email already in use");
}

#[tokio::test]
async fn test_register_unverified_email_twice_reclaims_the_slot() {
    let app = create_test_app();
    register(&app, "slow@example.com").await;
    let old_code = app.mailer.last_code_for("slow@example.com").unwrap();

    let token = register(&app, "slow@example.com").await;

    // The first registration's code no longer verifies
    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/auth/verify-otp")
        .add_header(name, value)
        .json(&json!({ "otp": old_code }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid or expired OTP");
}

#[tokio::test]
async fn test_register_email_case_is_normalized() {
    let app = create_test_app();
    register_verified(&app, "Mixed@Example.COM").await;

    // The OTP went out under the lowercased address
    assert_eq!(app.mailer.sent()[0].0, "mixed@example.com");

    let response = app
        .server
        .post("/api/auth/register")
        .json(&register_payload("mixed@example.com"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_malformed_payloads() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "password123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/api/auth/register")
        .json(&json!({ "email": "a@x.com", "password": "short" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_before_verification_is_forbidden() {
    let app = create_test_app();
    register(&app, "pending@example.com").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&register_payload("pending@example.com"))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"], "Email not verified");
}

#[tokio::test]
async fn test_login_after_verification_succeeds() {
    let app = create_test_app();
    register_verified(&app, "done@example.com").await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&register_payload("done@example.com"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["username"], "done");
    assert!(body["token"].as_str().is_some());
    assert!(set_cookie_headers(&response)[0].starts_with("token="));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_bodies_are_identical() {
    let app = create_test_app();
    register_verified(&app, "real@example.com").await;

    let wrong_password: Value = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "real@example.com", "password": "wrongpassword" }))
        .await
        .json();
    let unknown_email_response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "email": "ghost@example.com", "password": "password123" }))
        .await;

    assert_eq!(unknown_email_response.status_code(), StatusCode::BAD_REQUEST);
    let unknown_email: Value = unknown_email_response.json();
    assert_eq!(wrong_password, unknown_email);
}

// ============================================================================
// Who am I
// ============================================================================

#[tokio::test]
async fn test_me_returns_safe_projection() {
    let app = create_test_app();
    let token = register_verified(&app, "who@example.com").await;

    let (name, value) = bearer(&token);
    let response = app
        .server
        .get("/api/auth/me")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["email"], "who@example.com");
    assert_eq!(body["username"], "who");
    assert!(body.get("profilePicUrl").is_some());
    assert!(body.get("createdAt").is_some());
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_me_accepts_the_session_cookie() {
    let app = create_test_app();
    let token = register_verified(&app, "cookie@example.com").await;

    let response = app
        .server
        .get("/api/auth/me")
        .add_header(
            header::COOKIE,
            HeaderValue::from_str(&format!("token={}", token)).unwrap(),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_me_without_token_is_unauthorized() {
    let app = create_test_app();

    let response = app.server.get("/api/auth/me").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    // No token was presented, so there is nothing to clear
    assert!(set_cookie_headers(&response).is_empty());
}

#[tokio::test]
async fn test_me_with_expired_token_clears_the_cookie() {
    let app = create_test_app();
    register_verified(&app, "stale@example.com").await;

    let now = Utc::now().timestamp();
    let expired = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Claims {
            sub: Uuid::new_v4(),
            iat: now - 7200,
            exp: now - 3600,
        },
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let response = app
        .server
        .get("/api/auth/me")
        .add_header(
            header::COOKIE,
            HeaderValue::from_str(&format!("token={}", expired)).unwrap(),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let cookies = set_cookie_headers(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("token=;"));
    assert!(cookies[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn test_me_for_a_deleted_user_is_not_found() {
    let app = create_test_app();
    // Token for a user id the store has never seen
    let token = app.tokens.issue(Uuid::new_v4()).unwrap();

    let (name, value) = bearer(&token);
    let response = app
        .server
        .get("/api/auth/me")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ============================================================================
// OTP resend and verification
// ============================================================================

#[tokio::test]
async fn test_resend_while_code_is_active_is_refused() {
    let app = create_test_app();
    let token = register(&app, "eager@example.com").await;

    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/auth/resend-otp")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Please wait to resend OTP");
}

#[tokio::test]
async fn test_resend_after_verification_is_refused() {
    let app = create_test_app();
    let token = register_verified(&app, "done@example.com").await;

    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/auth/resend-otp")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Email already verified");
}

#[tokio::test]
async fn test_verify_otp_requires_a_code() {
    let app = create_test_app();
    let token = register(&app, "empty@example.com").await;

    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/auth/verify-otp")
        .add_header(name, value)
        .json(&json!({}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "OTP is required");
}

#[tokio::test]
async fn test_verify_otp_treats_a_non_string_code_as_missing() {
    let app = create_test_app();
    let token = register(&app, "typed@example.com").await;

    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/auth/verify-otp")
        .add_header(name, value)
        .json(&json!({ "otp": 123456 }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "OTP is required");
}

#[tokio::test]
async fn test_verify_otp_rejects_a_wrong_code() {
    let app = create_test_app();
    let token = register(&app, "guess@example.com").await;

    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/auth/verify-otp")
        .add_header(name, value)
        .json(&json!({ "otp": "000000" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid or expired OTP");
}

#[tokio::test]
async fn test_verify_otp_requires_authentication() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/auth/verify-otp")
        .json(&json!({ "otp": "123456" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// End-to-end flow
// ============================================================================

#[tokio::test]
async fn test_full_registration_flow() {
    let app = create_test_app();

    // Register
    let response = app
        .server
        .post("/api/auth/register")
        .json(&register_payload("flow@example.com"))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    let token = body["token"].as_str().unwrap().to_string();

    // Login before verification fails
    let response = app
        .server
        .post("/api/auth/login")
        .json(&register_payload("flow@example.com"))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    // Verify with the emailed code
    let code = app.mailer.last_code_for("flow@example.com").unwrap();
    let (name, value) = bearer(&token);
    let response = app
        .server
        .post("/api/auth/verify-otp")
        .add_header(name, value)
        .json(&json!({ "otp": code }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    // Login now succeeds
    let response = app
        .server
        .post("/api/auth/login")
        .json(&register_payload("flow@example.com"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["username"], "flow");
}

// ============================================================================
// Project catalog
// ============================================================================

#[tokio::test]
async fn test_list_projects() {
    let app = create_test_app();

    let response = app.server.get("/api/projects").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 2);
    // Wire format keeps the legacy snake_case image_url alongside camelCase
    assert!(body[0].get("image_url").is_some());
    assert!(body[0].get("projectInfo").is_some());
}

#[tokio::test]
async fn test_get_project_by_id() {
    let app = create_test_app();

    let response = app.server.get("/api/projects/id/prison-core").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["title"], "Prison Core");

    let response = app.server.get("/api/projects/id/no-such-project").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_project_by_title() {
    let app = create_test_app();

    let response = app.server.get("/api/projects/title/Skyblock%20Core").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["id"], "skyblock-core");

    let response = app.server.get("/api/projects/title/Unknown").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
