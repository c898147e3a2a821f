use anyhow::Context;
use serde_json::json;

use crate::cli::utils::{open_store, output_success};
use crate::cli::OutputFormat;
use crate::config::config;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store().await?;
    let result = store.migrate().await.context("migration failed");
    store.close().await;
    result?;

    output_success(
        output_format,
        "Schema is up to date",
        Some(json!({ "database": config().database.url })),
    )
}
