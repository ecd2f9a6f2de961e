//! Configuration error types.

use thiserror::Error;

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Configuration file not found: {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to load configuration from {source_name}: {message}")]
    LoadFailed {
        source_name: String,
        message: String,
    },

    #[error("Invalid value for '{field}': '{value}' ({context})")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },
}

impl ConfigurationError {
    pub fn config_file_not_found(path: impl Into<String>) -> Self {
        Self::ConfigFileNotFound { path: path.into() }
    }

    pub fn load_failed(source_name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::LoadFailed {
            source_name: source_name.into(),
            message: error.to_string(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }
}
