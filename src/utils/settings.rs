// App settings storage

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Error, Result};
use crate::utils::get_config_dir;

/// Drive query used when none is configured
pub const DEFAULT_QUERY: &str = "mimeType=\"audio/mpeg\" and trashed = false";

const ENV_CLIENT_ID: &str = "DRIVETUNES_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "DRIVETUNES_CLIENT_SECRET";
const ENV_PLAYER: &str = "DRIVETUNES_PLAYER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub client_id: String,
    pub client_secret: String,
    pub query: String,
    pub database_path: Option<PathBuf>,
    pub player_command: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            client_id: option_env!("DRIVETUNES_CLIENT_ID").unwrap_or_default().to_string(),
            client_secret: option_env!("DRIVETUNES_CLIENT_SECRET").unwrap_or_default().to_string(),
            query: DEFAULT_QUERY.to_string(),
            database_path: None,
            player_command: None,
        }
    }
}

impl AppSettings {
    /// Path of the SQLite song library
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| get_config_dir().join("songs.db"))
    }

    /// Fail early when no OAuth client is configured
    pub fn require_client(&self) -> Result<(&str, &str)> {
        if self.client_id.is_empty() {
            return Err(Error::Config(format!(
                "no OAuth client id - set {} or run `drivetunes config set client_id <id>`",
                ENV_CLIENT_ID
            )));
        }
        Ok((&self.client_id, &self.client_secret))
    }

    /// Set a single field by name, as used by `config set`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "client_id" => self.client_id = value.to_string(),
            "client_secret" => self.client_secret = value.to_string(),
            "query" => self.query = value.to_string(),
            "database_path" => self.database_path = non_empty(value).map(PathBuf::from),
            "player_command" => self.player_command = non_empty(value).map(str::to_string),
            other => return Err(Error::Config(format!("unknown setting: {}", other))),
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(ENV_CLIENT_ID) {
            self.client_id = value;
        }
        if let Ok(value) = std::env::var(ENV_CLIENT_SECRET) {
            self.client_secret = value;
        }
        if let Ok(value) = std::env::var(ENV_PLAYER) {
            self.player_command = non_empty(&value).map(str::to_string);
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Get the path to the settings file
pub fn get_settings_path() -> PathBuf {
    get_config_dir().join("settings.json")
}

/// Load settings from `path`, falling back to defaults for anything missing
pub fn load_settings_from(path: &Path) -> AppSettings {
    if !path.exists() {
        return AppSettings::default();
    }

    let json = fs::read_to_string(path).ok();
    json.and_then(|j| serde_json::from_str(&j).ok())
        .unwrap_or_default()
}

/// Load app settings from file, then apply environment overrides
pub fn load_settings() -> AppSettings {
    let mut settings = load_settings_from(&get_settings_path());
    settings.apply_env_overrides();
    settings
}

/// Save settings to `path`
pub fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    info!("Settings written to {}", path.display());
    Ok(())
}

/// Save app settings to file
pub fn save_settings(settings: &AppSettings) -> Result<()> {
    save_settings_to(&get_settings_path(), settings)
}
