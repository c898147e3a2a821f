use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::{AuthService, IdentityResolver, SessionGate};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::deadline::Deadline;
use crate::handlers;
use crate::middleware::{auth_guard, auth_panic_response, edge_gate};

/// Everything a handler may touch. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub auth: AuthService,
    pub sessions: SessionGate,
    pub config: Arc<AppConfig>,
    /// Fired on shutdown; aborts in-flight session checks and auth calls
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(store: Store, config: AppConfig, shutdown: CancellationToken) -> Self {
        let auth = AuthService::new(store.clone(), config.security.clone());
        let resolver: Arc<dyn IdentityResolver> = Arc::new(auth.clone());
        let sessions = SessionGate::new(resolver, Deadline::new(config.session_check_timeout(), shutdown.clone()));
        Self {
            store,
            auth,
            sessions,
            config: Arc::new(config),
            shutdown,
        }
    }

    /// Swap the identity source behind the session gate
    pub fn with_resolver(mut self, resolver: Arc<dyn IdentityResolver>) -> Self {
        self.sessions = SessionGate::new(
            resolver,
            Deadline::new(self.config.session_check_timeout(), self.shutdown.clone()),
        );
        self
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);
    let body_limit = state.config.api.max_request_size_bytes;

    Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/robots.txt", get(handlers::robots))
        .route("/sitemap.xml", get(handlers::sitemap))
        // Edge gated
        .route("/dashboard", get(handlers::dashboard))
        // API
        .merge(auth_routes(state.clone()))
        .merge(service_routes())
        .merge(content_routes())
        .merge(inbox_routes())
        // Global middleware
        .layer(from_fn_with_state(state.clone(), edge_gate))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn auth_routes(state: AppState) -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/api/auth/sign-up/email", post(auth::sign_up))
        .route("/api/auth/sign-in/email", post(auth::sign_in))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/auth/get-session", get(auth::get_session))
        .layer(from_fn_with_state(state, auth_guard))
        .layer(CatchPanicLayer::custom(auth_panic_response))
}

fn service_routes() -> Router<AppState> {
    use handlers::services;

    Router::new()
        .route("/api/services", get(services::services_list).post(services::services_post))
        .route("/api/services/items", get(services::items_search))
        .route(
            "/api/services/items/:id",
            get(services::item_get).put(services::item_put).delete(services::item_delete),
        )
        .route(
            "/api/services/:id",
            get(services::service_get).put(services::service_put).delete(services::service_delete),
        )
        .route("/api/services/:id/items", get(services::items_for_service).post(services::items_post))
}

fn content_routes() -> Router<AppState> {
    use handlers::content;

    Router::new()
        .route("/api/blog", get(content::blog_list).post(content::blog_post))
        .route("/api/blog/:slug", get(content::blog_get))
        .route("/api/portfolio", get(content::portfolio_list).post(content::portfolio_post))
        .route("/api/testimonials", get(content::testimonials_list).post(content::testimonials_post))
        .route("/api/team", get(content::team_list).post(content::team_post))
}

fn inbox_routes() -> Router<AppState> {
    use handlers::inbox;

    Router::new()
        .route("/api/contact", post(inbox::contact_post).get(inbox::contact_list))
        .route("/api/contact/:id", patch(inbox::contact_patch))
        .route("/api/careers", post(inbox::careers_post).get(inbox::careers_list))
        .route("/api/careers/:id", patch(inbox::careers_patch))
        .route("/api/projects", get(inbox::projects_list).post(inbox::projects_post))
        .route("/api/projects/:id", patch(inbox::projects_patch))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
