//! In-process test harness: an in-memory store behind the real router.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

use crate::app::{app, AppState};
use crate::auth::IdentityResolver;
use crate::config::AppConfig;
use crate::database::Store;
use crate::types::UserRole;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Router plus the state behind it
pub struct TestContext {
    pub state: AppState,
    router: Router,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON, or the raw text as a JSON string when the body is not JSON
    pub body: Value,
}

impl TestResponse {
    pub fn text(&self) -> &str {
        self.body.as_str().unwrap_or_default()
    }

    pub fn code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }
}

impl TestContext {
    /// Development config with sign-up enabled
    pub async fn new() -> anyhow::Result<Self> {
        let mut config = AppConfig::development();
        config.security.allow_sign_up = true;
        config.site.base_url = "https://agency.test".to_string();
        Self::with_config(config).await
    }

    pub async fn with_config(config: AppConfig) -> anyhow::Result<Self> {
        let store = Store::in_memory().await?;
        let state = AppState::new(store, config, CancellationToken::new());
        Ok(Self::from_state(state))
    }

    pub fn from_state(state: AppState) -> Self {
        let router = app(state.clone());
        Self { state, router }
    }

    /// Same store, different identity source
    pub fn with_resolver(self, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self::from_state(self.state.with_resolver(resolver))
    }

    /// Create a staff account and return a bearer token for it
    pub async fn staff_token(&self) -> anyhow::Result<String> {
        let email = format!("staff-{}@agency.test", Uuid::new_v4().simple());
        self.state
            .auth
            .create_user(&email, "Staff", TEST_PASSWORD, UserRole::Editor)
            .await?;
        let signed = self.state.auth.sign_in(&email, TEST_PASSWORD, None).await?;
        Ok(signed.token)
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid test request");
        self.send(request).await
    }

    /// Send a prepared request, e.g. one with a raw body or custom headers
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn get_as(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, None, Some(token)).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), token).await
    }

    pub async fn put(&self, uri: &str, body: Value, token: &str) -> TestResponse {
        self.request(Method::PUT, uri, Some(body), Some(token)).await
    }

    pub async fn patch(&self, uri: &str, body: Value, token: &str) -> TestResponse {
        self.request(Method::PATCH, uri, Some(body), Some(token)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None, Some(token)).await
    }
}
