use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use super::items_of;
use crate::api::{parse_id, Payload};
use crate::app::AppState;
use crate::database::models::{Service, ServiceItem, ServiceWithItems};
use crate::database::{Fields, Repository};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::filter::SortDirection;
use crate::middleware::{ApiResponse, Authenticated};

/// GET /api/services - active services with their items
pub async fn list(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let services = Repository::<Service>::new(&state.store);
    let mut filter = services.filter()?;
    filter
        .where_eq("is_active", json!(true))?
        .order("display_order", SortDirection::Asc)?
        .order("id", SortDirection::Asc)?;
    let services = services.list(filter).await?;

    // One query for all items, grouped in memory
    let items = Repository::<ServiceItem>::new(&state.store);
    let mut filter = items.filter()?;
    filter
        .order("display_order", SortDirection::Asc)?
        .order("id", SortDirection::Asc)?;
    let mut by_service: HashMap<i64, Vec<ServiceItem>> = HashMap::new();
    for item in items.list(filter).await? {
        by_service.entry(item.service_id).or_default().push(item);
    }

    let data: Vec<ServiceWithItems> = services
        .into_iter()
        .map(|service| {
            let items = by_service.remove(&service.id).unwrap_or_default();
            ServiceWithItems { service, items }
        })
        .collect();
    Ok(ApiResponse::success(data))
}

/// GET /api/services/:id - one service with its items
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ErrorCode::InvalidId)?;
    let service = Repository::<Service>::new(&state.store)
        .get(id)
        .await?
        .ok_or_else(service_not_found)?;
    let items = items_of(&state.store, service.id).await?;
    Ok(ApiResponse::success(ServiceWithItems { service, items }))
}

/// POST /api/services
pub async fn post(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = Payload::from_body(body)?;
    let icon = payload.required_str("icon", ErrorCode::MissingIcon, "Icon is required")?;
    let title = payload.required_str("title", ErrorCode::MissingTitle, "Title is required")?;
    let description = payload.require("description")?;
    let gradient = payload.optional_str("gradient")?.unwrap_or_default();
    let display_order = payload.optional_int("displayOrder", ErrorCode::InvalidDisplayOrder)?.unwrap_or(0);
    let is_active = payload.optional_bool("isActive")?.unwrap_or(true);

    let fields = Fields::new()
        .set("icon", icon)
        .set("title", title)
        .set("description", description)
        .set("gradient", gradient)
        .set("display_order", display_order)
        .set("is_active", is_active);
    let service = Repository::<Service>::new(&state.store).insert(fields).await?;

    info!(service_id = service.id, user_id = identity.user.id, "service_created");
    Ok(ApiResponse::created(service))
}

/// PUT /api/services/:id - partial update
pub async fn put(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ErrorCode::InvalidId)?;
    let repo = Repository::<Service>::new(&state.store);
    if !repo.exists(id).await? {
        return Err(service_not_found());
    }

    let payload = Payload::from_body(body)?;
    let mut fields = Fields::new();
    if payload.has("icon") {
        fields.push("icon", payload.required_str("icon", ErrorCode::MissingIcon, "Icon cannot be blank")?);
    }
    if payload.has("title") {
        fields.push("title", payload.required_str("title", ErrorCode::MissingTitle, "Title cannot be blank")?);
    }
    if payload.has("description") {
        fields.push("description", payload.require("description")?);
    }
    if payload.has("gradient") {
        fields.push("gradient", payload.optional_str("gradient")?.unwrap_or_default());
    }
    let fields = fields
        .set_some("display_order", payload.optional_int("displayOrder", ErrorCode::InvalidDisplayOrder)?)
        .set_some("is_active", payload.optional_bool("isActive")?);
    if fields.is_empty() {
        return Err(ApiError::bad_request(ErrorCode::MissingField, "No updatable fields supplied"));
    }

    let service = repo.update(id, fields).await?.ok_or_else(service_not_found)?;
    info!(service_id = id, user_id = identity.user.id, "service_updated");
    Ok(ApiResponse::success(service))
}

/// DELETE /api/services/:id - refused while the service still has items
pub async fn delete(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ErrorCode::InvalidId)?;
    let repo = Repository::<Service>::new(&state.store);
    if !repo.exists(id).await? {
        return Err(service_not_found());
    }

    let items = Repository::<ServiceItem>::new(&state.store);
    let mut filter = items.filter()?;
    filter.where_eq("service_id", json!(id))?;
    let item_count = items.count(filter).await?;
    if item_count > 0 {
        return Err(ApiError::conflict(
            ErrorCode::ServiceHasItems,
            format!("Service still has {} item(s); delete them first", item_count),
        ));
    }

    repo.delete(id).await?;
    info!(service_id = id, user_id = identity.user.id, "service_deleted");
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

fn service_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::ServiceNotFound, "Service not found")
}
