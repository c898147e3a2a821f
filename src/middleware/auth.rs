use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::info;

use crate::app::AppState;
use crate::auth::Identity;
use crate::error::ApiError;

/// Signed-in user for API routes. Rejects with 401 `UNAUTHORIZED`.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // The edge gate may already have resolved this request
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(Self(identity.clone()));
        }
        state
            .sessions
            .identity(&parts.headers)
            .await
            .map(Authenticated)
            .ok_or_else(ApiError::unauthorized)
    }
}

/// Redirects anonymous requests for protected pages to the login page.
/// Any failure to resolve the session counts as anonymous.
pub async fn edge_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let security = &state.config.security;
    if !is_protected(request.uri().path(), &security.protected_prefixes) {
        return next.run(request).await;
    }

    match state.sessions.identity(request.headers()).await {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => {
            info!(path = %request.uri().path(), "Redirecting anonymous request to {}", security.login_path);
            Redirect::temporary(&security.login_path).into_response()
        }
    }
}

/// `prefix` itself or anything below `prefix/`
pub fn is_protected(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        !prefix.is_empty()
            && (path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/')))
    })
}
