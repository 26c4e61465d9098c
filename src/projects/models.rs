// Catalog data models
//
// JSON field names follow the storefront's existing wire format, which mixes
// camelCase with a legacy snake_case `image_url`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Release tier of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ProjectStatus {
    Basic,
    Standard,
    Premium,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuthor {
    pub username: String,
    pub avatar_url: String,
}

/// Changelog entry attached to a project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub id: String,
    pub title: String,
    pub description: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledgement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_link: Option<String>,
    pub author: UpdateAuthor,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectComment {
    pub id: String,
    pub profile_image: String,
    pub username: String,
    pub comment: String,
    /// "1" through "5"
    pub rating: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBuild {
    pub build_id: String,
    pub project_version: String,
    pub github_link: String,
    pub download_link: String,
    pub release_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_latest: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_deprecated: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVersion {
    pub mc_version: String,
    pub builds: Vec<ProjectBuild>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub author: String,
    pub total_downloads: i64,
    pub first_release: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub status: ProjectStatus,
    /// "1" through "5"
    pub rating: String,
    pub total_ratings: i64,
}

/// Catalog record; nested documents live in JSONB columns
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub discord_link: String,
    pub donation_link: String,
    pub description: String,
    #[serde(rename = "image_url")]
    pub image_url: String,
    pub category: String,
    #[schema(value_type = Vec<ProjectUpdate>)]
    pub updates: Json<Vec<ProjectUpdate>>,
    #[schema(value_type = Vec<ProjectComment>)]
    pub comments: Json<Vec<ProjectComment>>,
    #[schema(value_type = Vec<ProjectVersion>)]
    pub versions: Json<Vec<ProjectVersion>>,
    #[schema(value_type = ProjectInfo)]
    pub project_info: Json<ProjectInfo>,
}
