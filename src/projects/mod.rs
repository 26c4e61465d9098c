// Project catalog module (read-only listing/lookup)

pub mod handlers;
pub mod models;
pub mod repository;

pub use handlers::{get_project_by_id, get_project_by_title, list_projects};
pub use models::Project;
pub use repository::{InMemoryProjectStore, PostgresProjectStore, ProjectStore};
