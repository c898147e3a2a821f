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
use crate::database::models::ContactSubmission;
use crate::database::{Fields, Repository};
use crate::error::{ApiResult, ErrorCode};
use crate::filter::SortDirection;
use crate::middleware::{ApiResponse, Authenticated};
use crate::types::SubmissionStatus;

const STATUSES: &[&str] = &["new", "contacted", "resolved"];

#[derive(Debug, Default, Deserialize)]
pub struct ContactQuery {
    pub status: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

/// POST /api/contact - public form submission
pub async fn post(State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>) -> ApiResult<impl IntoResponse> {
    let payload = Payload::from_body(body)?;
    let name = payload.require("name")?;
    let email = payload.email("email")?;
    let message = payload.require("message")?;

    let fields = Fields::new()
        .set("name", name)
        .set("email", email)
        .set("company", payload.optional_str("company")?)
        .set("phone", payload.optional_str("phone")?)
        .set("service", payload.optional_str("service")?)
        .set("budget", payload.optional_str("budget")?)
        .set("message", message)
        .set("status", SubmissionStatus::New.as_str());
    let submission = Repository::<ContactSubmission>::new(&state.store).insert(fields).await?;

    info!(submission_id = submission.id, "contact_submitted");
    Ok(ApiResponse::created(submission))
}

/// GET /api/contact - newest first
pub async fn list(
    Authenticated(_): Authenticated,
    State(state): State<AppState>,
    Query(query): Query<ContactQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = Page::from_query(&query.page, &state.config.api)?;
    let repo = Repository::<ContactSubmission>::new(&state.store);
    let mut filter = repo.filter()?;
    if let Some(raw) = query.status.as_deref() {
        let status = status_query(raw, SubmissionStatus::parse, STATUSES)?;
        filter.where_eq("status", json!(status.as_str()))?;
    }
    filter
        .order("created_at", SortDirection::Desc)?
        .order("id", SortDirection::Desc)?
        .limit(page.limit, Some(page.offset))?;
    Ok(ApiResponse::success(repo.list(filter).await?))
}

/// PATCH /api/contact/:id
pub async fn patch(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ErrorCode::InvalidId)?;
    let payload = Payload::from_body(body)?;
    let status = status_from(&payload, SubmissionStatus::parse, STATUSES)?;
    let submission = set_status::<ContactSubmission>(&state.store, id, status.as_str()).await?;

    info!(submission_id = id, status = %status, user_id = identity.user.id, "contact_status_updated");
    Ok(ApiResponse::success(submission))
}
