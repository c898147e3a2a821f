use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde_json::json;

use crate::api::normalize_email;
use crate::auth::AuthService;
use crate::cli::utils::{open_store, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::types::UserRole;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a staff account (works even when public sign-up is disabled)")]
    Create {
        #[arg(long, help = "Login email")]
        email: String,
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Password, at least 8 characters")]
        password: String,
        #[arg(long, default_value = "editor", help = "admin or editor")]
        role: String,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create { email, name, password, role } => {
            let role = UserRole::parse(&role).ok_or_else(|| anyhow!("unknown role '{}', expected admin or editor", role))?;
            let email = normalize_email(&email).map_err(|e| anyhow!("{}", e.message()))?;

            let store = open_store().await?;
            store.migrate().await.context("migration failed")?;
            let auth = AuthService::new(store.clone(), config().security.clone());
            let result = auth.create_user(&email, name.trim(), &password, role).await;
            store.close().await;
            let user = result.context("failed to create user")?;

            output_success(
                output_format,
                &format!("Created {} {}", user.role, user.email),
                Some(json!({ "id": user.id, "email": user.email, "role": user.role })),
            )
        }
    }
}
