//! Application configuration.
//!
//! Resolution priority for every setting: config file, then environment,
//! then built-in default. The webhook URL has no default; starting without
//! one is a configuration error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding the webhook URL.
pub const WEBHOOK_URL_ENV: &str = "RELAY_WEBHOOK_URL";
/// Environment variable overriding the storage directory.
pub const STORAGE_DIR_ENV: &str = "RELAY_STORAGE_DIR";

/// Root of the TOML config file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct RelayConfig {
    #[serde(default)]
    pub webhook: WebhookSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct WebhookSettings {
    /// Endpoint URL every send is POSTed to.
    pub url: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct StorageSettings {
    /// Directory holding `chats.json` and `session_id`.
    pub dir: Option<PathBuf>,
}

impl RelayConfig {
    /// Loads the config file at `path`, or an empty config when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;

        Ok(toml::from_str(&text)?)
    }

    /// Loads from the default location (`<config-dir>/relay/config.toml`),
    /// or an empty config when the directory cannot be determined.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Resolves the webhook URL: file, then `RELAY_WEBHOOK_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingWebhookUrl`] when neither is set.
    pub fn webhook_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = non_blank(self.webhook.url.as_deref()) {
            return Ok(url);
        }

        std::env::var(WEBHOOK_URL_ENV)
            .ok()
            .and_then(|value| non_blank(Some(&value)))
            .ok_or(ConfigError::MissingWebhookUrl)
    }

    /// Resolves the storage directory: file, then `RELAY_STORAGE_DIR`,
    /// then `~/.relay`.
    pub fn storage_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.dir {
            return dir.clone();
        }

        if let Ok(dir) = std::env::var(STORAGE_DIR_ENV)
            && !dir.trim().is_empty()
        {
            return PathBuf::from(dir);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".relay")
    }
}

/// Returns the default config file path, `<config-dir>/relay/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("relay").join("config.toml"))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
