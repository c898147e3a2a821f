use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::repository::Entity;

/// Job application received from the careers page
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CareerApplication {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: String,
    pub resume_url: Option<String>,
    pub cover_letter: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for CareerApplication {
    const TABLE: &'static str = "career_applications";
}

/// Message received from the contact form
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub budget: Option<String>,
    pub message: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for ContactSubmission {
    const TABLE: &'static str = "contact_submissions";
}
