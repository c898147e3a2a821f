use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use super::gate::{Identity, IdentityResolver};
use super::{decode_token, generate_token, hash_password, verify_password, AuthError, Claims, MIN_PASSWORD_LEN};
use crate::config::SecurityConfig;
use crate::database::models::{Session, User};
use crate::database::{DatabaseError, Fields, Repository, Store};
use crate::types::{now_timestamp, UserRole};

/// Result of a successful sign-up or sign-in
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub session: Session,
    pub token: String,
}

/// Email/password accounts and server-side sessions
#[derive(Clone)]
pub struct AuthService {
    store: Store,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    pub fn allow_sign_up(&self) -> bool {
        self.security.allow_sign_up
    }

    /// Create an account. Expects an already normalized email.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn create_user(&self, email: &str, name: &str, password: &str, role: UserRole) -> Result<User, AuthError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        if self.find_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(password.to_string()).await?;
        let fields = Fields::new()
            .set("email", email)
            .set("name", name)
            .set("role", role.as_str())
            .set("password_hash", password_hash);

        let user = match Repository::<User>::new(&self.store).insert(fields).await {
            Ok(user) => user,
            // Lost a race with a concurrent sign-up
            Err(e) if e.is_unique_violation() => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        };
        info!(user_id = user.id, role = %role, "user_created");
        Ok(user)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        name: &str,
        password: &str,
        user_agent: Option<String>,
    ) -> Result<AuthSession, AuthError> {
        if !self.security.allow_sign_up {
            return Err(AuthError::SignUpDisabled);
        }
        let user = self.create_user(email, name, password, UserRole::Editor).await?;
        self.start_session(user, user_agent).await
    }

    #[instrument(skip_all, fields(email = %email))]
    pub async fn sign_in(&self, email: &str, password: &str, user_agent: Option<String>) -> Result<AuthSession, AuthError> {
        let user = self.find_user_by_email(email).await?.ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            return Err(AuthError::InvalidCredentials);
        }
        info!(user_id = user.id, "user_signed_in");
        self.start_session(user, user_agent).await
    }

    /// Revoke the session named by the request's token, if any
    pub async fn sign_out(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let Some(token) = self.token_from_headers(headers) else {
            return Ok(());
        };
        let Ok(claims) = decode_token(&token, &self.security.session_secret) else {
            return Ok(());
        };
        let pool = self.store.pool();
        self.store
            .bounded(async {
                sqlx::query("DELETE FROM sessions WHERE id = ?")
                    .bind(&claims.sid)
                    .execute(pool)
                    .await?;
                Ok::<_, DatabaseError>(())
            })
            .await?;
        info!(user_id = claims.sub, "user_signed_out");
        Ok(())
    }

    /// Live session and user for a token. Expired or revoked sessions resolve to None.
    pub async fn session_for_token(&self, token: &str) -> Result<Option<Identity>, AuthError> {
        let claims = decode_token(token, &self.security.session_secret)?;
        let pool = self.store.pool();
        let now = now_timestamp();
        let session = self
            .store
            .bounded(async {
                let row = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ? AND user_id = ? AND expires_at > ?")
                    .bind(&claims.sid)
                    .bind(claims.sub)
                    .bind(&now)
                    .fetch_optional(pool)
                    .await?;
                Ok::<_, DatabaseError>(row)
            })
            .await?;

        let Some(session) = session else {
            return Ok(None);
        };
        let user = Repository::<User>::new(&self.store).get(session.user_id).await?;
        Ok(user.map(|user| Identity { user, session }))
    }

    /// Bearer token first, then the session cookie
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if let Some(token) = bearer {
            return Some(token.to_string());
        }
        CookieJar::from_headers(headers)
            .get(&self.security.session_cookie_name)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.security.session_cookie_name.clone(), token);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.security.secure_cookies);
        cookie.set_same_site(SameSite::Lax);
        cookie
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::from(self.security.session_cookie_name.clone());
        cookie.set_path("/");
        cookie.make_removal();
        cookie
    }

    async fn start_session(&self, user: User, user_agent: Option<String>) -> Result<AuthSession, AuthError> {
        let session_id = Uuid::new_v4().to_string();
        let created_at = now_timestamp();
        let expires_at = (Utc::now() + Duration::hours(self.security.session_ttl_hours as i64))
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let pool = self.store.pool();
        let session = self
            .store
            .bounded(async {
                let row = sqlx::query_as::<_, Session>(
                    "INSERT INTO sessions (id, user_id, expires_at, user_agent, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
                )
                .bind(&session_id)
                .bind(user.id)
                .bind(&expires_at)
                .bind(&user_agent)
                .bind(&created_at)
                .fetch_one(pool)
                .await?;
                Ok::<_, DatabaseError>(row)
            })
            .await?;

        let token = generate_token(&Claims::new(user.id, session_id, self.security.session_ttl_hours), &self.security.session_secret)?;
        Ok(AuthSession { user, session, token })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let repo = Repository::<User>::new(&self.store);
        let mut filter = repo.filter()?;
        filter.where_eq("email", json!(email))?;
        Ok(repo.find_one(filter).await?)
    }
}

#[async_trait]
impl IdentityResolver for AuthService {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Identity>, AuthError> {
        match self.token_from_headers(headers) {
            Some(token) => self.session_for_token(&token).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::HeaderValue;

    async fn service() -> AuthService {
        let store = Store::in_memory().await.unwrap();
        AuthService::new(store, AppConfig::development().security)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token)).unwrap());
        headers
    }

    #[tokio::test]
    async fn sign_up_then_resolve_then_sign_out() {
        let auth = service().await;
        let signed = auth.sign_up("ana@agency.test", "Ana", "password123", None).await.unwrap();
        assert_eq!(signed.user.role, "editor");

        let headers = bearer(&signed.token);
        let identity = auth.resolve(&headers).await.unwrap().unwrap();
        assert_eq!(identity.user.email, "ana@agency.test");
        assert_eq!(identity.session.id, signed.session.id);

        auth.sign_out(&headers).await.unwrap();
        assert!(auth.resolve(&headers).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_and_weak_sign_ups_are_refused() {
        let auth = service().await;
        auth.sign_up("ana@agency.test", "Ana", "password123", None).await.unwrap();
        assert!(matches!(
            auth.sign_up("ana@agency.test", "Ana", "password123", None).await,
            Err(AuthError::EmailTaken)
        ));
        assert!(matches!(
            auth.sign_up("bo@agency.test", "Bo", "short", None).await,
            Err(AuthError::WeakPassword)
        ));
    }

    #[tokio::test]
    async fn sign_in_checks_password() {
        let auth = service().await;
        auth.create_user("ana@agency.test", "Ana", "password123", UserRole::Admin).await.unwrap();
        assert!(auth.sign_in("ana@agency.test", "password123", Some("test".into())).await.is_ok());
        assert!(matches!(
            auth.sign_in("ana@agency.test", "nope-nope", None).await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.sign_in("nobody@agency.test", "password123", None).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn sign_up_can_be_disabled() {
        let store = Store::in_memory().await.unwrap();
        let mut security = AppConfig::development().security;
        security.allow_sign_up = false;
        let auth = AuthService::new(store, security);
        assert!(matches!(
            auth.sign_up("ana@agency.test", "Ana", "password123", None).await,
            Err(AuthError::SignUpDisabled)
        ));
    }

    #[tokio::test]
    async fn cookie_is_read_when_no_bearer() {
        let auth = service().await;
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("other=1; agency_session=tok"));
        assert_eq!(auth.token_from_headers(&headers).as_deref(), Some("tok"));
        assert!(auth.token_from_headers(&HeaderMap::new()).is_none());
    }
}
