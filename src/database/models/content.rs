use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::database::repository::Entity;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub author: String,
    pub tags: Json<Vec<String>>,
    pub is_published: bool,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for BlogPost {
    const TABLE: &'static str = "blog_posts";
    const SEARCH_COLUMNS: &'static [(&'static str, &'static str)] = &[("tags", "search_tags")];
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub client: String,
    pub category: String,
    pub description: String,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub technologies: Json<Vec<String>>,
    pub is_featured: bool,
    pub display_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for PortfolioItem {
    const TABLE: &'static str = "portfolio_items";
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: i64,
    pub client_name: String,
    pub client_role: String,
    pub company: String,
    pub content: String,
    /// 1 to 5
    pub rating: i64,
    pub avatar_url: Option<String>,
    pub is_featured: bool,
    pub display_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for Testimonial {
    const TABLE: &'static str = "testimonials";
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub bio: String,
    pub image_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for TeamMember {
    const TABLE: &'static str = "team_members";
}
