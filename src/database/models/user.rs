use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::repository::Entity;

/// Staff account allowed into the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for User {
    const TABLE: &'static str = "users";
}

/// Server-side session row; the id travels inside the signed token
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub expires_at: String,
    pub user_agent: Option<String>,
    pub created_at: String,
}
