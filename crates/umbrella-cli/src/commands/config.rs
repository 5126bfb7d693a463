//! Config commands
//!
//! Commands for managing CLI configuration.

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use tabled::Tabled;
use umbrella_core::config::{load_config_from, save_config_to, CONFIG_KEYS};

use super::Context;
use crate::output::{note, print_list, success};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
}

/// Config row for table display
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

pub async fn execute(ctx: &Context, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show_config(ctx).await,
        ConfigAction::Set { key, value } => set_config(ctx, &key, &value),
        ConfigAction::Get { key } => get_config(ctx, &key),
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    let rows = get_all_config(ctx).await?;
    print_list(&rows, ctx.format)
}

fn get_config(ctx: &Context, key: &str) -> Result<()> {
    let value = ctx.config.get(key)?;
    println!("{}", value);
    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    // Edit the file as stored; env overrides must not leak into it
    let path = umbrella_core::get_config_path()?;
    let mut config = load_config_from(&path)?;
    config.set(key, value)?;
    save_config_to(&config, &path)?;

    success(&format!("{} = {}", key, config.get(key)?), ctx.quiet);
    if key == "api_base_url" && std::env::var("UMBRELLA_API_URL").is_ok() {
        note("Note: UMBRELLA_API_URL is set and takes precedence.", ctx.quiet);
    }
    Ok(())
}

async fn get_all_config(ctx: &Context) -> Result<Vec<ConfigRow>> {
    let mut rows = Vec::new();

    let config_path = umbrella_core::get_config_path()?;
    let file_exists = config_path.exists();
    rows.push(ConfigRow {
        key: "UMBRELLA_CONFIG".to_string(),
        value: config_path.to_string_lossy().to_string(),
        source: path_source("UMBRELLA_CONFIG"),
    });

    let session_path = umbrella_core::get_session_path()?;
    rows.push(ConfigRow {
        key: "UMBRELLA_SESSION_PATH".to_string(),
        value: session_path.to_string_lossy().to_string(),
        source: path_source("UMBRELLA_SESSION_PATH"),
    });

    for key in CONFIG_KEYS {
        let source = if key == "api_base_url" && std::env::var("UMBRELLA_API_URL").is_ok() {
            "env"
        } else if file_exists {
            "file"
        } else {
            "default"
        };
        rows.push(ConfigRow {
            key: key.to_string(),
            value: ctx.config.get(key)?,
            source: source.to_string(),
        });
    }

    let token = ctx.services.auth.session().token().await;
    rows.push(ConfigRow {
        key: "session_token".to_string(),
        value: mask_token(&token),
        source: if token.is_some() { "session" } else { "n/a" }.to_string(),
    });

    Ok(rows)
}

fn path_source(var: &str) -> String {
    if std::env::var(var).is_ok() { "env" } else { "default" }.to_string()
}

fn mask_token(token: &Option<String>) -> String {
    match token {
        Some(t) if t.chars().count() > 8 => {
            let head: String = t.chars().take(4).collect();
            format!("{}...****", head)
        }
        Some(_) => "****".to_string(),
        None => "-".to_string(),
    }
}
