//! Error types shared across the relay core.

use thiserror::Error;

/// Errors raised by the local persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// Errors raised while resolving the application configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    /// The config file exists but is not valid TOML.
    #[error("Serialization error: TOML - {0}")]
    Parse(String),

    /// No webhook URL in the config file, the environment, or defaults.
    #[error("No webhook URL configured: set [webhook] url or RELAY_WEBHOOK_URL")]
    MissingWebhookUrl,
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// A type alias for `Result<T, StorageError>`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
