//! CLI commands module
//!
//! Contains all CLI command implementations.

pub mod agent;
pub mod auth;
pub mod candidature;
pub mod config;
pub mod planning;
pub mod site;
pub mod user;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Serialize;
use umbrella_core::{AppConfig, ServiceRegistry, User};

use crate::output::OutputFormat;

/// Shared context for all commands
pub struct Context {
    pub services: ServiceRegistry,
    pub config: AppConfig,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Context {
    /// The logged-in user, or an error asking to log in
    pub async fn require_user(&self) -> Result<User> {
        self.services
            .auth
            .current_user()
            .await
            .ok_or_else(|| anyhow!(umbrella_core::Error::Unauthorized("no session".to_string())))
    }
}

/// Text shown to the user for a failed command
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<umbrella_core::Error>() {
        Some(core) => core.user_message(),
        None => err.to_string(),
    }
}

pub fn is_unauthorized(err: &anyhow::Error) -> bool {
    err.downcast_ref::<umbrella_core::Error>()
        .is_some_and(|e| e.is_unauthorized())
}

/// Parse date string supporting common formats
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if s == "today" {
        return Ok(chrono::Local::now().date_naive());
    }
    if s == "tomorrow" {
        return Ok(chrono::Local::now().date_naive() + chrono::Duration::days(1));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date format: {}. Use YYYY-MM-DD", s))
}

/// Refuse an update that would change nothing
pub fn ensure_changes<T: Serialize>(patch: &T) -> Result<()> {
    let value = serde_json::to_value(patch)?;
    if value.as_object().is_some_and(|fields| fields.is_empty()) {
        anyhow::bail!("Aucune modification fournie");
    }
    Ok(())
}

/// Truncate string to max characters with ellipsis
pub fn truncate(s: &str, max_chars: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = chars[..max_chars.saturating_sub(3)].iter().collect();
        format!("{}...", truncated)
    }
}
