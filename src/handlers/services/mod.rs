pub mod items;
pub mod service;

use serde_json::json;

use crate::database::models::ServiceItem;
use crate::database::{DatabaseError, Repository, Store};
use crate::filter::SortDirection;

// Re-export handler functions for use in routing
pub use service::delete as service_delete;
pub use service::get as service_get;
pub use service::list as services_list;
pub use service::post as services_post;
pub use service::put as service_put;

pub use items::delete as item_delete;
pub use items::get as item_get;
pub use items::list_for_service as items_for_service;
pub use items::post as items_post;
pub use items::put as item_put;
pub use items::search as items_search;

/// Items of one service in display order
pub(crate) async fn items_of(store: &Store, service_id: i64) -> Result<Vec<ServiceItem>, DatabaseError> {
    let repo = Repository::<ServiceItem>::new(store);
    let mut filter = repo.filter()?;
    filter
        .where_eq("service_id", json!(service_id))?
        .order("display_order", SortDirection::Asc)?
        .order("id", SortDirection::Asc)?;
    repo.list(filter).await
}
