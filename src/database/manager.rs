use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, Executor, SqlitePool};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::deadline::{Deadline, DeadlineError};
use crate::filter::FilterError;

/// URL schemes of hosted libSQL endpoints, which this build cannot reach
const REMOTE_SCHEMES: &[&str] = &["libsql://", "http://", "https://", "wss://", "ws://"];

/// Errors from the record store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Unsupported database backend: {0} (only local SQLite URLs are supported)")]
    UnsupportedBackend(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Database call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Database call cancelled")]
    Cancelled,

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation())
    }
}

impl From<DeadlineError> for DatabaseError {
    fn from(err: DeadlineError) -> Self {
        match err {
            DeadlineError::Elapsed(limit) => DatabaseError::Timeout(limit),
            DeadlineError::Cancelled => DatabaseError::Cancelled,
        }
    }
}

/// Handle to the relational store. Built once by the entry point and shared
/// by cloning; all clones use the same connection pool.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
    deadline: Deadline,
}

impl Store {
    pub async fn connect(config: &DatabaseConfig, cancel: CancellationToken) -> Result<Self, DatabaseError> {
        let url = config.url.trim();
        if url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        if let Some(scheme) = REMOTE_SCHEMES.iter().find(|s| url.starts_with(*s)) {
            return Err(DatabaseError::UnsupportedBackend(scheme.trim_end_matches("://").to_string()));
        }
        if config.auth_token.is_some() {
            warn!("DATABASE_AUTH_TOKEN is set but local SQLite databases do not use it");
        }

        let in_memory = Self::is_memory_url(url);
        let mut options = SqliteConnectOptions::from_str(url)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?
            .create_if_missing(true)
            .foreign_keys(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }
        if !config.enable_query_logging {
            options = options.disable_statement_logging();
        }

        let timeout = Duration::from_secs(config.query_timeout_secs);
        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(timeout);
        pool_options = if in_memory {
            // Every connection to :memory: is its own database, so pin exactly one
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(config.max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        info!(in_memory, max_connections = pool.options().get_max_connections(), "Connected record store");

        Ok(Self {
            pool,
            deadline: Deadline::new(timeout, cancel),
        })
    }

    /// Private, migrated in-memory store
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            auth_token: None,
            max_connections: 1,
            query_timeout_secs: 15,
            enable_query_logging: false,
        };
        let store = Self::connect(&config, CancellationToken::new()).await?;
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run a store call under the query deadline
    pub async fn bounded<T, F>(&self, fut: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, DatabaseError>>,
    {
        match self.deadline.run(fut).await {
            Ok(res) => res,
            Err(e) => {
                warn!(error = %e, "Record store call abandoned");
                Err(e.into())
            }
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        self.bounded(async {
            // Unprepared execution so the multi-statement script runs in one call
            self.pool.execute(super::schema::SCHEMA).await?;
            Ok::<_, DatabaseError>(())
        })
        .await?;
        info!("Applied record store schema");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        self.bounded(async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok::<_, DatabaseError>(())
        })
        .await
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed record store");
    }

    fn is_memory_url(url: &str) -> bool {
        url.contains(":memory:") || url.contains("mode=memory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            auth_token: None,
            max_connections: 2,
            query_timeout_secs: 15,
            enable_query_logging: false,
        }
    }

    #[test]
    fn detects_memory_urls() {
        assert!(Store::is_memory_url("sqlite::memory:"));
        assert!(Store::is_memory_url("sqlite://file:agency?mode=memory&cache=shared"));
        assert!(!Store::is_memory_url("sqlite://agency.db?mode=rwc"));
    }

    #[tokio::test]
    async fn rejects_remote_backends() {
        let err = Store::connect(&config("libsql://agency.turso.io"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedBackend(ref s) if s == "libsql"));

        let err = Store::connect(&config("  "), CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConfigMissing("DATABASE_URL")));
    }

    #[tokio::test]
    async fn in_memory_store_is_migrated_and_healthy() {
        let store = Store::in_memory().await.unwrap();
        store.health_check().await.unwrap();
        // Migration is idempotent
        store.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn slow_calls_surface_as_timeout() {
        let store = Store::in_memory().await.unwrap();
        tokio::time::pause();
        let err = store
            .bounded(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, DatabaseError>(())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Timeout(d) if d == Duration::from_secs(15)));
    }
}
