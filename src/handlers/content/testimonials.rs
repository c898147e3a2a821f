use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::{parse_flag, Page, PageQuery, Payload};
use crate::app::AppState;
use crate::database::models::Testimonial;
use crate::database::{Fields, Repository};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::filter::SortDirection;
use crate::middleware::{ApiResponse, Authenticated};

#[derive(Debug, Default, Deserialize)]
pub struct TestimonialQuery {
    pub featured: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<TestimonialQuery>) -> ApiResult<impl IntoResponse> {
    let page = Page::from_query(&query.page, &state.config.api)?;
    let repo = Repository::<Testimonial>::new(&state.store);
    let mut filter = repo.filter()?;
    if let Some(raw) = query.featured.as_deref() {
        filter.where_eq("is_featured", json!(parse_flag("featured", raw)?))?;
    }
    filter
        .order("display_order", SortDirection::Asc)?
        .order("id", SortDirection::Asc)?
        .limit(page.limit, Some(page.offset))?;
    Ok(ApiResponse::success(repo.list(filter).await?))
}

pub async fn post(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = Payload::from_body(body)?;
    let client_name = payload.require("clientName")?;
    let client_role = payload.require("clientRole")?;
    let company = payload.require("company")?;
    let content = payload.require("content")?;
    let rating = match payload.optional_int("rating", ErrorCode::InvalidRating)? {
        None => 5,
        Some(r) if (1..=5).contains(&r) => r,
        Some(_) => return Err(ApiError::bad_request(ErrorCode::InvalidRating, "rating must be between 1 and 5")),
    };

    let fields = Fields::new()
        .set("client_name", client_name)
        .set("client_role", client_role)
        .set("company", company)
        .set("content", content)
        .set("rating", rating)
        .set("avatar_url", payload.optional_str("avatarUrl")?)
        .set("is_featured", payload.optional_bool("isFeatured")?.unwrap_or(false))
        .set(
            "display_order",
            payload.optional_int("displayOrder", ErrorCode::InvalidDisplayOrder)?.unwrap_or(0),
        );
    let testimonial = Repository::<Testimonial>::new(&state.store).insert(fields).await?;

    info!(testimonial_id = testimonial.id, user_id = identity.user.id, "testimonial_created");
    Ok(ApiResponse::created(testimonial))
}
