use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::api::{Page, PageQuery, Payload};
use crate::app::AppState;
use crate::database::models::TeamMember;
use crate::database::{Fields, Repository};
use crate::error::{ApiResult, ErrorCode};
use crate::filter::SortDirection;
use crate::middleware::{ApiResponse, Authenticated};

/// GET /api/team - active members only
pub async fn list(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<impl IntoResponse> {
    let page = Page::from_query(&query, &state.config.api)?;
    let repo = Repository::<TeamMember>::new(&state.store);
    let mut filter = repo.filter()?;
    filter
        .where_eq("is_active", json!(true))?
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
    let fields = Fields::new()
        .set("name", payload.require("name")?)
        .set("role", payload.require("role")?)
        .set("bio", payload.require("bio")?)
        .set("image_url", payload.optional_str("imageUrl")?)
        .set("linkedin_url", payload.optional_str("linkedinUrl")?)
        .set(
            "display_order",
            payload.optional_int("displayOrder", ErrorCode::InvalidDisplayOrder)?.unwrap_or(0),
        )
        .set("is_active", payload.optional_bool("isActive")?.unwrap_or(true));
    let member = Repository::<TeamMember>::new(&state.store).insert(fields).await?;

    info!(member_id = member.id, user_id = identity.user.id, "team_member_created");
    Ok(ApiResponse::created(member))
}
