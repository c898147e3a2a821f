use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::repository::Entity;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClientProject {
    pub id: i64,
    pub client_name: String,
    pub client_email: String,
    pub project_name: String,
    pub description: Option<String>,
    pub status: String,
    /// Whole currency units
    pub budget: Option<i64>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for ClientProject {
    const TABLE: &'static str = "client_projects";
}
