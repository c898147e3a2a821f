use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Serialize;
use tracing::warn;

use super::AuthError;
use crate::database::models::{Session, User};
use crate::deadline::Deadline;

/// The signed-in user behind a request
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub user: User,
    pub session: Session,
}

/// Turns request headers into an identity. `Ok(None)` means anonymous.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Identity>, AuthError>;
}

/// Bounded identity lookup shared by the API extractor and the edge gate.
///
/// Never fails: a slow, cancelled or broken resolver reads as "no identity",
/// and the resolver future is dropped when the bound passes.
#[derive(Clone)]
pub struct SessionGate {
    resolver: Arc<dyn IdentityResolver>,
    deadline: Deadline,
}

impl SessionGate {
    pub fn new(resolver: Arc<dyn IdentityResolver>, deadline: Deadline) -> Self {
        Self { resolver, deadline }
    }

    pub async fn identity(&self, headers: &HeaderMap) -> Option<Identity> {
        match self.deadline.run(self.resolver.resolve(headers)).await {
            Ok(Ok(identity)) => identity,
            Ok(Err(e)) => {
                warn!("Session check failed: {}", e);
                None
            }
            Err(e) => {
                warn!("Session check abandoned: {}", e);
                None
            }
        }
    }
}
