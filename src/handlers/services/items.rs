use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::items_of;
use crate::api::{parse_id, Page, PageQuery, Payload};
use crate::app::AppState;
use crate::database::models::{Service, ServiceItem};
use crate::database::{Fields, Repository};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::filter::SortDirection;
use crate::middleware::{ApiResponse, Authenticated};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSearchQuery {
    pub id: Option<String>,
    pub service_id: Option<String>,
    pub search: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

/// GET /api/services/items - `?id=` lookup, or filtered and paginated list
pub async fn search(State(state): State<AppState>, Query(query): Query<ItemSearchQuery>) -> ApiResult<impl IntoResponse> {
    let repo = Repository::<ServiceItem>::new(&state.store);

    if let Some(raw) = query.id.as_deref().filter(|s| !s.trim().is_empty()) {
        let id = parse_id(raw, ErrorCode::InvalidId)?;
        let item = repo.get(id).await?.ok_or_else(item_not_found)?;
        return Ok(ApiResponse::success(json!(item)));
    }

    let page = Page::from_query(&query.page, &state.config.api)?;
    let mut filter = repo.filter()?;
    if let Some(raw) = query.service_id.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.where_eq("service_id", json!(parse_id(raw, ErrorCode::InvalidServiceId)?))?;
    }
    if let Some(term) = query.search.as_deref() {
        filter.search(&["search_title", "search_icon"], term)?;
    }
    filter
        .order("display_order", SortDirection::Asc)?
        .order("id", SortDirection::Asc)?
        .limit(page.limit, Some(page.offset))?;

    let items = repo.list(filter).await?;
    Ok(ApiResponse::success(json!(items)))
}

/// GET /api/services/items/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ErrorCode::InvalidId)?;
    let item = Repository::<ServiceItem>::new(&state.store)
        .get(id)
        .await?
        .ok_or_else(item_not_found)?;
    Ok(ApiResponse::success(item))
}

/// GET /api/services/:id/items
pub async fn list_for_service(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    let service_id = parse_id(&id, ErrorCode::InvalidServiceId)?;
    if !Repository::<Service>::new(&state.store).exists(service_id).await? {
        return Err(service_not_found());
    }
    Ok(ApiResponse::success(items_of(&state.store, service_id).await?))
}

/// POST /api/services/:id/items
///
/// Checks run in a fixed order and the first failure is returned: session,
/// service id, service existence, body shape, icon, title, items, displayOrder.
pub async fn post(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let service_id = parse_id(&id, ErrorCode::InvalidServiceId)?;
    if !Repository::<Service>::new(&state.store).exists(service_id).await? {
        return Err(service_not_found());
    }

    let payload = Payload::from_body(body)?;
    let icon = payload.required_str("icon", ErrorCode::MissingIcon, "Icon is required")?;
    let title = payload.required_str("title", ErrorCode::MissingTitle, "Title is required")?;
    let labels = payload.item_labels("items")?;
    let display_order = payload
        .optional_int("displayOrder", ErrorCode::InvalidDisplayOrder)?
        .unwrap_or(0);

    let fields = Fields::new()
        .set("service_id", service_id)
        .set("icon", icon)
        .set("title", title)
        .set("items", labels)
        .set("display_order", display_order);
    let item = Repository::<ServiceItem>::new(&state.store).insert(fields).await?;

    info!(item_id = item.id, service_id, user_id = identity.user.id, "service_item_created");
    Ok(ApiResponse::created(item))
}

/// PUT /api/services/items/:id - partial update
pub async fn put(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ErrorCode::InvalidId)?;
    let repo = Repository::<ServiceItem>::new(&state.store);
    if !repo.exists(id).await? {
        return Err(item_not_found());
    }

    let payload = Payload::from_body(body)?;
    let mut fields = Fields::new();
    if payload.has("icon") {
        fields.push("icon", payload.required_str("icon", ErrorCode::MissingIcon, "Icon cannot be blank")?);
    }
    if payload.has("title") {
        fields.push("title", payload.required_str("title", ErrorCode::MissingTitle, "Title cannot be blank")?);
    }
    if payload.has("items") {
        fields.push("items", payload.item_labels("items")?);
    }
    let fields = fields.set_some(
        "display_order",
        payload.optional_int("displayOrder", ErrorCode::InvalidDisplayOrder)?,
    );
    if fields.is_empty() {
        return Err(ApiError::bad_request(ErrorCode::MissingField, "No updatable fields supplied"));
    }

    let item = repo.update(id, fields).await?.ok_or_else(item_not_found)?;
    info!(item_id = id, user_id = identity.user.id, "service_item_updated");
    Ok(ApiResponse::success(item))
}

/// DELETE /api/services/items/:id
pub async fn delete(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ErrorCode::InvalidId)?;
    if !Repository::<ServiceItem>::new(&state.store).delete(id).await? {
        return Err(item_not_found());
    }
    info!(item_id = id, user_id = identity.user.id, "service_item_deleted");
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

fn item_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::ItemNotFound, "Service item not found")
}

fn service_not_found() -> ApiError {
    ApiError::not_found(ErrorCode::ServiceNotFound, "Service not found")
}
