use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{set_status, status_from, status_query};
use crate::api::{parse_id, validate_date, Page, PageQuery, Payload};
use crate::app::AppState;
use crate::database::models::ClientProject;
use crate::database::{Fields, Repository};
use crate::error::{ApiResult, ErrorCode};
use crate::filter::SortDirection;
use crate::middleware::{ApiResponse, Authenticated};
use crate::types::ProjectStatus;

const STATUSES: &[&str] = &["planning", "in_progress", "review", "completed", "on_hold"];

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub status: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

pub async fn list(
    Authenticated(_): Authenticated,
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = Page::from_query(&query.page, &state.config.api)?;
    let repo = Repository::<ClientProject>::new(&state.store);
    let mut filter = repo.filter()?;
    if let Some(raw) = query.status.as_deref() {
        let status = status_query(raw, ProjectStatus::parse, STATUSES)?;
        filter.where_eq("status", json!(status.as_str()))?;
    }
    filter
        .order("created_at", SortDirection::Desc)?
        .order("id", SortDirection::Desc)?
        .limit(page.limit, Some(page.offset))?;
    Ok(ApiResponse::success(repo.list(filter).await?))
}

/// POST /api/projects
pub async fn post(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = Payload::from_body(body)?;
    let client_name = payload.require("clientName")?;
    let client_email = payload.email("clientEmail")?;
    let project_name = payload.require("projectName")?;
    let status = if payload.has("status") {
        status_from(&payload, ProjectStatus::parse, STATUSES)?
    } else {
        ProjectStatus::Planning
    };
    let budget = payload.optional_int("budget", ErrorCode::InvalidField)?;
    let start_date = payload
        .optional_str("startDate")?
        .map(|d| validate_date("startDate", &d))
        .transpose()?;
    let due_date = payload
        .optional_str("dueDate")?
        .map(|d| validate_date("dueDate", &d))
        .transpose()?;

    let fields = Fields::new()
        .set("client_name", client_name)
        .set("client_email", client_email)
        .set("project_name", project_name)
        .set("description", payload.optional_str("description")?)
        .set("status", status.as_str())
        .set("budget", budget)
        .set("start_date", start_date)
        .set("due_date", due_date);
    let project = Repository::<ClientProject>::new(&state.store).insert(fields).await?;

    info!(project_id = project.id, status = %status, user_id = identity.user.id, "client_project_created");
    Ok(ApiResponse::created(project))
}

/// PATCH /api/projects/:id
pub async fn patch(
    Authenticated(identity): Authenticated,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, ErrorCode::InvalidId)?;
    let payload = Payload::from_body(body)?;
    let status = status_from(&payload, ProjectStatus::parse, STATUSES)?;
    let project = set_status::<ClientProject>(&state.store, id, status.as_str()).await?;

    info!(project_id = id, status = %status, user_id = identity.user.id, "client_project_status_updated");
    Ok(ApiResponse::success(project))
}
