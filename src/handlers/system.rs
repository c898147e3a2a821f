use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::app::AppState;
use crate::types::now_timestamp;

/// GET / - service descriptor
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": state.config.site.name,
        "version": env!("CARGO_PKG_VERSION"),
        "site": state.config.site.base_url,
        "endpoints": {
            "services": "/api/services[/:id[/items]], /api/services/items[/:id]",
            "content": "/api/blog[/:slug], /api/portfolio, /api/testimonials, /api/team",
            "inbox": "/api/contact[/:id], /api/careers[/:id], /api/projects[/:id]",
            "auth": "/api/auth/sign-up/email, /api/auth/sign-in/email, /api/auth/sign-out, /api/auth/get-session",
            "seo": "/robots.txt, /sitemap.xml",
            "dashboard": "/dashboard (signed in)",
        }
    }))
}

/// GET /health - 503 when the record store does not answer
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = now_timestamp();
    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok", "timestamp": timestamp })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unavailable", "timestamp": timestamp })),
            )
        }
    }
}
