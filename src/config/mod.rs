use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Session secret used when nothing is configured. Refused in production.
pub const DEVELOPMENT_SESSION_SECRET: &str = "agency-site-development-secret-change-me";

/// One year
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub site: SiteConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
    pub max_connections: u32,
    pub query_timeout_secs: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Canonical public origin, used for sitemap and robots output
    pub base_url: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub default_list_limit: i64,
    pub max_list_limit: i64,
    pub max_request_size_bytes: usize,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub session_secret: String,
    pub session_ttl_hours: u64,
    pub session_cookie_name: String,
    pub session_check_timeout_ms: u64,
    pub auth_timeout_ms: u64,
    pub allow_sign_up: bool,
    pub secure_cookies: bool,
    pub cors_origins: Vec<String>,
    /// Path prefixes guarded by the edge gate
    pub protected_prefixes: Vec<String>,
    pub login_path: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SITE_URL is not a valid absolute URL: {0}")]
    InvalidSiteUrl(String),

    #[error("SESSION_SECRET must be set to a non-default value in production")]
    InsecureSessionSecret,

    #[error("API_MAX_LIST_LIMIT must be at least API_DEFAULT_LIST_LIMIT and positive")]
    InvalidListLimits,

    #[error("SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}, got {0}")]
    InvalidSessionTtl(u64),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_AUTH_TOKEN") {
            self.database.auth_token = Some(v).filter(|t| !t.is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_QUERY_TIMEOUT_SECS") {
            self.database.query_timeout_secs = v.parse().unwrap_or(self.database.query_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // Site overrides
        if let Ok(v) = env::var("SITE_URL") {
            self.site.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("SITE_NAME") {
            self.site.name = v;
        }

        // API overrides
        if let Ok(v) = env::var("API_DEFAULT_LIST_LIMIT") {
            self.api.default_list_limit = v.parse().unwrap_or(self.api.default_list_limit);
        }
        if let Ok(v) = env::var("API_MAX_LIST_LIMIT") {
            self.api.max_list_limit = v.parse().unwrap_or(self.api.max_list_limit);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("SESSION_TTL_HOURS") {
            self.security.session_ttl_hours = v.parse().unwrap_or(self.security.session_ttl_hours);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.security.session_cookie_name = v;
        }
        if let Ok(v) = env::var("SESSION_CHECK_TIMEOUT_MS") {
            self.security.session_check_timeout_ms = v.parse().unwrap_or(self.security.session_check_timeout_ms);
        }
        if let Ok(v) = env::var("AUTH_TIMEOUT_MS") {
            self.security.auth_timeout_ms = v.parse().unwrap_or(self.security.auth_timeout_ms);
        }
        if let Ok(v) = env::var("AUTH_ALLOW_SIGN_UP") {
            self.security.allow_sign_up = v.parse().unwrap_or(self.security.allow_sign_up);
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("SECURITY_PROTECTED_PREFIXES") {
            self.security.protected_prefixes = split_list(&v);
        }
        if let Ok(v) = env::var("SECURITY_LOGIN_PATH") {
            self.security.login_path = v;
        }

        self
    }

    /// Reject combinations the server must not start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.site.base_url)
            .ok()
            .filter(|u| u.has_host())
            .ok_or_else(|| ConfigError::InvalidSiteUrl(self.site.base_url.clone()))?;

        if self.environment == Environment::Production
            && (self.security.session_secret.is_empty()
                || self.security.session_secret == DEVELOPMENT_SESSION_SECRET)
        {
            return Err(ConfigError::InsecureSessionSecret);
        }

        if self.api.default_list_limit <= 0 || self.api.max_list_limit < self.api.default_list_limit {
            return Err(ConfigError::InvalidListLimits);
        }

        let ttl = self.security.session_ttl_hours;
        if ttl == 0 || ttl > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::InvalidSessionTtl(ttl));
        }

        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: "sqlite://agency.db?mode=rwc".to_string(),
                auth_token: None,
                max_connections: 5,
                query_timeout_secs: 15,
                enable_query_logging: true,
            },
            site: SiteConfig {
                base_url: "http://localhost:3000".to_string(),
                name: "Agency".to_string(),
            },
            api: ApiConfig {
                default_list_limit: 50,
                max_list_limit: 100,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                enable_request_logging: true,
            },
            security: SecurityConfig {
                session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                session_ttl_hours: 24 * 7, // 1 week
                session_cookie_name: "agency_session".to_string(),
                session_check_timeout_ms: 5_000,
                auth_timeout_ms: 20_000,
                allow_sign_up: true,
                secure_cookies: false,
                cors_origins: vec!["http://localhost:3000".to_string()],
                protected_prefixes: vec!["/dashboard".to_string()],
                login_path: "/login".to_string(),
            },
        }
    }

    pub fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 10;
        config.database.enable_query_logging = false;
        config.site.base_url = "https://staging.agency.example".to_string();
        config.security.session_ttl_hours = 24;
        config.security.allow_sign_up = false;
        config.security.secure_cookies = true;
        config.security.cors_origins = vec!["https://staging.agency.example".to_string()];
        config
    }

    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 20;
        config.database.enable_query_logging = false;
        config.site.base_url = "https://agency.example".to_string();
        config.api.max_request_size_bytes = 1024 * 1024;
        config.api.enable_request_logging = false;
        config.security.session_secret = String::new();
        config.security.session_ttl_hours = 24;
        config.security.allow_sign_up = false;
        config.security.secure_cookies = true;
        config.security.cors_origins = vec!["https://agency.example".to_string()];
        config
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.database.query_timeout_secs)
    }

    pub fn session_check_timeout(&self) -> Duration {
        Duration::from_millis(self.security.session_check_timeout_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.security.auth_timeout_ms)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - read once by the binaries, then handed to AppState
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
