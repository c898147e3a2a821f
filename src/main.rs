use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agency_site::config::config;
use agency_site::database::Store;
use agency_site::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SITE_URL, etc.
    let _ = dotenvy::dotenv();

    let config = config().clone();

    let default_filter = if config.api.enable_request_logging {
        "agency_site=info,tower_http=info"
    } else {
        "agency_site=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();

    config.validate().context("invalid configuration")?;
    info!("Starting agency site in {:?} mode", config.environment);

    let shutdown = CancellationToken::new();
    let store = Store::connect(&config.database, shutdown.clone())
        .await
        .context("failed to open database")?;
    store.migrate().await.context("failed to apply schema")?;

    // Allow tests or deployments to override port via env
    let port = std::env::var("AGENCY_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Agency site listening on http://{}", bind_addr);

    let router = app(AppState::new(store.clone(), config, shutdown.clone()));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("server error")?;

    store.close().await;
    info!("Shut down cleanly");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM and fires the shared token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
    token.cancel();
}
