//! Email/password auth endpoints under `/api/auth`.
//!
//! Every route here runs behind `auth_guard`, so an internal failure surfaces
//! as the generic `AUTH_SERVICE_ERROR` body rather than the usual envelope.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};

use crate::api::Payload;
use crate::app::AppState;
use crate::error::ApiResult;
use crate::middleware::ApiResponse;

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// POST /api/auth/sign-up/email
pub async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = Payload::from_body(body)?;
    let email = payload.email("email")?;
    let name = payload.require("name")?;
    let password = payload.require("password")?;

    let signed = state.auth.sign_up(&email, &name, &password, user_agent(&headers)).await?;
    let jar = CookieJar::new().add(state.auth.session_cookie(signed.token.clone()));
    Ok((jar, ApiResponse::created(signed)))
}

/// POST /api/auth/sign-in/email
pub async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let payload = Payload::from_body(body)?;
    let email = payload.email("email")?;
    let password = payload.require("password")?;

    let signed = state.auth.sign_in(&email, &password, user_agent(&headers)).await?;
    let jar = CookieJar::new().add(state.auth.session_cookie(signed.token.clone()));
    Ok((jar, ApiResponse::success(signed)))
}

/// POST /api/auth/sign-out - succeeds with or without a live session
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    state.auth.sign_out(&headers).await?;
    let jar = CookieJar::new().add(state.auth.removal_cookie());
    Ok((jar, ApiResponse::success(json!({ "success": true }))))
}

/// GET /api/auth/get-session - `{user, session}` or `null`
pub async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    ApiResponse::success(state.sessions.identity(&headers).await)
}
