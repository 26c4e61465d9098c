// Catalog store port and adapters (read-only)

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::ApiError;
use crate::projects::models::Project;

const PROJECT_COLUMNS: &str = "id, title, price, discord_link, donation_link, description, \
     image_url, category, updates, comments, versions, project_info";

/// Read-only persistence port for catalog records
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Project>, ApiError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Project>, ApiError>;
    async fn find_by_title(&self, title: &str) -> Result<Option<Project>, ApiError>;
}

pub struct PostgresProjectStore {
    pool: PgPool,
}

impl PostgresProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PostgresProjectStore {
    async fn list(&self) -> Result<Vec<Project>, ApiError> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY title"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>, ApiError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Project>, ApiError> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE title = $1"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }
}

/// Fixed in-memory catalog, used by handler tests
#[derive(Default)]
pub struct InMemoryProjectStore {
    projects: Vec<Project>,
}

impl InMemoryProjectStore {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn list(&self) -> Result<Vec<Project>, ApiError> {
        Ok(self.projects.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Project>, ApiError> {
        Ok(self.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Project>, ApiError> {
        Ok(self.projects.iter().find(|p| p.title == title).cloned())
    }
}
