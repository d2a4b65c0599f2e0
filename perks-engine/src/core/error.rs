use shared::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid perks config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid perks config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::config(err.to_string())
    }
}

/// Result alias for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;
