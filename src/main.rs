pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod projects;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::{AuthService, OtpDispatcher, PostgresOtpStore, PostgresUserStore, SmtpMailer, TokenService};
use config::Config;
use projects::{
    models::{
        Project, ProjectBuild, ProjectComment, ProjectInfo, ProjectStatus, ProjectUpdate,
        ProjectVersion, UpdateAuthor,
    },
    PostgresProjectStore, ProjectStore,
};

/// OpenAPI documentation structure (catalog endpoints)
#[derive(OpenApi)]
#[openapi(
    paths(
        projects::handlers::list_projects,
        projects::handlers::get_project_by_id,
        projects::handlers::get_project_by_title,
    ),
    components(
        schemas(
            Project,
            ProjectUpdate,
            UpdateAuthor,
            ProjectComment,
            ProjectBuild,
            ProjectVersion,
            ProjectInfo,
            ProjectStatus
        )
    ),
    tags(
        (name = "projects", description = "Project catalog endpoints")
    ),
    info(
        title = "Marketplace API",
        version = "1.0.0",
        description = "Authentication and project catalog services"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub projects: Arc<dyn ProjectStore>,
    pub tokens: TokenService,
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ProjectStore> {
    fn from_ref(state: &AppState) -> Self {
        state.projects.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Creates and configures the application router
pub fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Auth routes
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route(
            "/api/auth/me",
            get(auth::me_handler).post(auth::me_handler),
        )
        .route("/api/auth/resend-otp", post(auth::resend_otp_handler))
        .route("/api/auth/verify-otp", post(auth::verify_otp_handler))
        // Catalog routes
        .route("/api/projects", get(projects::list_projects))
        .route("/api/projects/id/:id", get(projects::get_project_by_id))
        .route(
            "/api/projects/title/:title",
            get(projects::get_project_by_title),
        )
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Marketplace API - Starting...");

    let config = Config::from_env().expect("Invalid configuration");

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let mailer = SmtpMailer::new(&config.smtp).expect("Invalid SMTP configuration");
    let tokens = TokenService::new(config.jwt_secret.clone());

    let auth_service = AuthService::new(
        Arc::new(PostgresUserStore::new(pool.clone())),
        OtpDispatcher::new(
            Arc::new(PostgresOtpStore::new(pool.clone())),
            Arc::new(mailer),
        ),
        tokens.clone(),
        config.secure_cookies,
    );

    let state = AppState {
        auth: Arc::new(auth_service),
        projects: Arc::new(PostgresProjectStore::new(pool)),
        tokens,
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Marketplace API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}

#[cfg(test)]
mod tests;
