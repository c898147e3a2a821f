use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{set_status, status_from, status_query};
use crate::api::{parse_id, Page, PageQuery, Payload};
use crate::app::AppState;
use crate::database::models::CareerApplication;
use crate::database::{Fields, Repository};
use crate::error::{ApiResult, ErrorCode};
use crate::filter::SortDirection;
use crate::middleware::{ApiResponse, Authenticated};
use crate::types::ApplicationStatus;

const STATUSES: &[&str] = &["new", "reviewing", "interviewed", "rejected", "hired"];

#[derive(Debug, Default, Deserialize)]
pub struct CareersQuery {
    pub status: Option<String>,
    pub position: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

/// POST /api/careers
pub async fn post(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> ApiResult<impl IntoResponse> {
    let payload = Payload::from_body(body)?;
    let full_name = payload.require("fullName")?;
    let email = payload.email("email")?;
    let position = payload.require("position")?;

    let fields = Fields::new()
        .set("full_name", full_name)
        .set("email", email)
        .set("phone", payload.optional_str("phone")?)
        .set("position", position)
        .set("resume_url", payload.optional_str("resumeUrl")?)
        .set("cover_letter", payload.optional_str("coverLetter")?)
        .set("status", ApplicationStatus::New.as_str());
    let application = Repository::<CareerApplication>::new(&state.store).insert(fields).await?;

    info!(application_id = application.id, position = %application.position, "career_application_received");
    Ok(ApiResponse::created(application))
}

pub async fn list(
    Authenticated(_): Authenticated,
    State(state): State<AppState>,
    Query(query): Query<CareersQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = Page::from_query(&query.page, &state.config.api)?;
    let repo = Repository::<CareerApplication>::new(&state.store);
    let mut filter = repo.filter()?;
    if let Some(raw) = query.status.as_deref() {
        let status = status_query(raw, ApplicationStatus::parse, STATUSES)?;
        filter.where_eq("status", json!(status.as_str()))?;
    }
    if let Some(position) = query.position.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        filter.where_eq("position", json!(position))?;
    }
    filter
        .order("created_at", SortDirection::Desc)?
        .order("id", SortDirection::Desc)?
        .limit(page.limit, Some(page.offset))?;
    Ok(ApiResponse::success(repo.list(filter).await?))
}

pub async fn patch(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ErrorCode::InvalidId)?;
    let payload = Payload::from_body(body)?;
    let status = status_from(&payload, ApplicationStatus::parse, STATUSES)?;
    let application = set_status::<CareerApplication>(&state.store, id, status.as_str()).await?;

    info!(application_id = id, status = %status, user_id = identity.user.id, "career_status_updated");
    Ok(ApiResponse::success(application))
}
