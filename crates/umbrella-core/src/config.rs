//! Client configuration and on-disk locations

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Keys accepted by [`AppConfig::get`] and [`AppConfig::set`]
pub const CONFIG_KEYS: [&str; 2] = ["api_base_url", "timeout_secs"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "api_base_url" => Ok(self.api_base_url.clone()),
            "timeout_secs" => Ok(self.timeout_secs.to_string()),
            _ => Err(unknown_key(key)),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api_base_url" => {
                let url = value.trim();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(Error::config(format!(
                        "api_base_url must start with http:// or https://, got {}",
                        value
                    )));
                }
                self.api_base_url = url.trim_end_matches('/').to_string();
            }
            "timeout_secs" => {
                self.timeout_secs = value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|v| *v > 0)
                    .ok_or_else(|| {
                        Error::config(format!("timeout_secs must be a positive integer, got {}", value))
                    })?;
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> Error {
    Error::config(format!(
        "Unknown config key: {}. Valid keys: {}",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "umbrella", "Umbrella")
        .ok_or_else(|| Error::config("Could not determine project directories"))
}

/// Location of `config.json`
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("UMBRELLA_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    Ok(project_dirs()?.config_dir().join("config.json"))
}

/// Location of the persisted session
pub fn get_session_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("UMBRELLA_SESSION_PATH") {
        return Ok(PathBuf::from(path));
    }
    Ok(project_dirs()?.data_dir().join("session.json"))
}

/// Read the configuration file; a missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Load the configuration, applying the `UMBRELLA_API_URL` override
pub fn load_config() -> Result<AppConfig> {
    let mut config = load_config_from(&get_config_path()?)?;
    if let Ok(url) = std::env::var("UMBRELLA_API_URL") {
        if !url.trim().is_empty() {
            config.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
    }
    Ok(config)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(config, &get_config_path()?)
}
