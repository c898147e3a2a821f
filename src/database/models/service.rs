use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::database::repository::Entity;

/// Top-level offering shown on the services page
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub icon: String,
    pub title: String,
    pub description: String,
    pub gradient: String,
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for Service {
    const TABLE: &'static str = "services";
}

/// A titled group of labels belonging to one service
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceItem {
    pub id: i64,
    pub service_id: i64,
    pub icon: String,
    pub title: String,
    pub items: Json<Vec<String>>,
    pub display_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for ServiceItem {
    const TABLE: &'static str = "service_items";
    const SEARCH_COLUMNS: &'static [(&'static str, &'static str)] =
        &[("title", "search_title"), ("icon", "search_icon")];
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceWithItems {
    #[serde(flatten)]
    pub service: Service,
    pub items: Vec<ServiceItem>,
}
