use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::{parse_flag, validate_slug, Page, PageQuery, Payload};
use crate::app::AppState;
use crate::database::models::PortfolioItem;
use crate::database::{Fields, Repository};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::filter::SortDirection;
use crate::middleware::{ApiResponse, Authenticated};

#[derive(Debug, Default, Deserialize)]
pub struct PortfolioQuery {
    pub category: Option<String>,
    pub featured: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

/// GET /api/portfolio
pub async fn list(State(state): State<AppState>, Query(query): Query<PortfolioQuery>) -> ApiResult<impl IntoResponse> {
    let page = Page::from_query(&query.page, &state.config.api)?;
    let repo = Repository::<PortfolioItem>::new(&state.store);
    let mut filter = repo.filter()?;
    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        filter.where_eq("category", json!(category))?;
    }
    if let Some(raw) = query.featured.as_deref() {
        filter.where_eq("is_featured", json!(parse_flag("featured", raw)?))?;
    }
    filter
        .order("display_order", SortDirection::Asc)?
        .order("id", SortDirection::Asc)?
        .limit(page.limit, Some(page.offset))?;
    Ok(ApiResponse::success(repo.list(filter).await?))
}

/// POST /api/portfolio
pub async fn post(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = Payload::from_body(body)?;
    let slug = validate_slug(&payload.require("slug")?)?;
    let fields = Fields::new()
        .set("slug", slug.clone())
        .set("title", payload.require("title")?)
        .set("client", payload.require("client")?)
        .set("category", payload.require("category")?)
        .set("description", payload.require("description")?)
        .set("image_url", payload.optional_str("imageUrl")?)
        .set("project_url", payload.optional_str("projectUrl")?)
        .set("technologies", payload.optional_str_list("technologies")?.unwrap_or_default())
        .set("is_featured", payload.optional_bool("isFeatured")?.unwrap_or(false))
        .set(
            "display_order",
            payload.optional_int("displayOrder", ErrorCode::InvalidDisplayOrder)?.unwrap_or(0),
        );

    let item = match Repository::<PortfolioItem>::new(&state.store).insert(fields).await {
        Ok(item) => item,
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::conflict(ErrorCode::SlugTaken, format!("Slug '{}' is already in use", slug)))
        }
        Err(e) => return Err(e.into()),
    };

    info!(portfolio_id = item.id, user_id = identity.user.id, "portfolio_item_created");
    Ok(ApiResponse::created(item))
}
