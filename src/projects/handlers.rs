// HTTP handlers for the read-only project catalog

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::ApiError;
use crate::projects::{models::Project, repository::ProjectStore};

/// Handler for GET /api/projects
/// Lists every catalog entry
#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "List of all projects", body = Vec<Project>),
        (status = 500, description = "Internal server error")
    ),
    tag = "projects"
)]
pub async fn list_projects(
    State(store): State<Arc<dyn ProjectStore>>,
) -> Result<Json<Vec<Project>>, ApiError> {
    tracing::debug!("Listing all projects");
    let projects = store.list().await?;
    tracing::debug!("Retrieved {} projects", projects.len());
    Ok(Json(projects))
}

/// Handler for GET /api/projects/id/:id
#[utoipa::path(
    get,
    path = "/api/projects/id/{id}",
    params(("id" = String, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project found", body = Project),
        (status = 404, description = "Project not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "projects"
)]
pub async fn get_project_by_id(
    State(store): State<Arc<dyn ProjectStore>>,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    tracing::debug!("Fetching project with id: {}", id);
    let project = store.find_by_id(&id).await?.ok_or_else(|| ApiError::NotFound {
        resource: "Project".to_string(),
        key: id,
    })?;
    Ok(Json(project))
}

/// Handler for GET /api/projects/title/:title
#[utoipa::path(
    get,
    path = "/api/projects/title/{title}",
    params(("title" = String, Path, description = "Project title")),
    responses(
        (status = 200, description = "Project found", body = Project),
        (status = 404, description = "Project not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "projects"
)]
pub async fn get_project_by_title(
    State(store): State<Arc<dyn ProjectStore>>,
    Path(title): Path<String>,
) -> Result<Json<Project>, ApiError> {
    tracing::debug!("Fetching project with title: {}", title);
    let project = store
        .find_by_title(&title)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            resource: "Project".to_string(),
            key: title,
        })?;
    Ok(Json(project))
}
