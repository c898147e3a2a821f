pub mod careers;
pub mod contact;
pub mod projects;

use serde_json::json;

use crate::api::Payload;
use crate::database::{Entity, Fields, Repository, Store};
use crate::error::{ApiError, ApiResult, ErrorCode};

pub use careers::list as careers_list;
pub use careers::patch as careers_patch;
pub use careers::post as careers_post;
pub use contact::list as contact_list;
pub use contact::patch as contact_patch;
pub use contact::post as contact_post;
pub use projects::list as projects_list;
pub use projects::patch as projects_patch;
pub use projects::post as projects_post;

/// Reads `status` from a body and checks it against the allowed set
pub(crate) fn status_from<S>(payload: &Payload, parse: impl Fn(&str) -> Option<S>, allowed: &[&str]) -> ApiResult<S> {
    let raw = payload.required_str("status", ErrorCode::InvalidStatus, "status is required")?;
    parse(&raw).ok_or_else(|| invalid_status(&raw, allowed))
}

/// `?status=` filter value
pub(crate) fn status_query<S>(raw: &str, parse: impl Fn(&str) -> Option<S>, allowed: &[&str]) -> ApiResult<S> {
    parse(raw).ok_or_else(|| invalid_status(raw, allowed))
}

fn invalid_status(raw: &str, allowed: &[&str]) -> ApiError {
    ApiError::bad_request(
        ErrorCode::InvalidStatus,
        format!("Invalid status '{}', expected one of: {}", raw.trim(), allowed.join(", ")),
    )
}

/// Status is the only field staff may change on inbox records
pub(crate) async fn set_status<T: Entity>(store: &Store, id: i64, status: &str) -> ApiResult<T> {
    Repository::<T>::new(store)
        .update(id, Fields::new().set("status", json!(status)))
        .await?
        .ok_or_else(|| ApiError::not_found(ErrorCode::RecordNotFound, format!("Record {} not found", id)))
}
