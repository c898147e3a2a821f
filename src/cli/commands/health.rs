use std::time::Duration;

use anyhow::{bail, Context};
use serde_json::{json, Value};

use crate::cli::utils::{open_store, output_error, output_success};
use crate::cli::OutputFormat;

pub async fn handle(url: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    match url {
        Some(url) => check_server(&url, output_format).await,
        None => check_database(output_format).await,
    }
}

async fn check_server(url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let endpoint = format!("{}/health", url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build HTTP client")?;
    let response = client
        .get(&endpoint)
        .send()
        .await
        .with_context(|| format!("could not reach {}", endpoint))?;

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if status.is_success() {
        output_success(output_format, &format!("{} is healthy", url), Some(body))
    } else {
        output_error(output_format, &format!("{} answered {}", url, status), Some("UNHEALTHY"))?;
        bail!("server unhealthy")
    }
}

async fn check_database(output_format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store().await?;
    let result = store.health_check().await;
    store.close().await;

    match result {
        Ok(()) => output_success(output_format, "Database is reachable", Some(json!({ "database": "ok" }))),
        Err(e) => {
            output_error(output_format, &format!("Database check failed: {}", e), Some("UNHEALTHY"))?;
            bail!("database unhealthy")
        }
    }
}
