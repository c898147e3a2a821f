use std::any::Any;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::app::AppState;
use crate::deadline::Deadline;
use crate::error::ApiError;

/// Bounds `/api/auth/*` handlers and hides their internal failures.
///
/// A handler that overruns `security.auth_timeout_ms` is dropped, and any 500 it
/// produced is replaced with the generic `AUTH_SERVICE_ERROR` body.
pub async fn auth_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let deadline = Deadline::new(state.config.auth_timeout(), state.shutdown.clone());
    match deadline.run(next.run(request)).await {
        Ok(response) if response.status() == StatusCode::INTERNAL_SERVER_ERROR => ApiError::AuthService.into_response(),
        Ok(response) => response,
        Err(e) => {
            error!("Auth endpoint abandoned: {}", e);
            ApiError::AuthService.into_response()
        }
    }
}

/// `CatchPanicLayer` handler for the auth routes
pub fn auth_panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Auth endpoint panicked: {}", detail);
    ApiError::AuthService.into_response()
}
