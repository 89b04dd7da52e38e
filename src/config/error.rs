//! Configuration error types

use thiserror::Error;

use crate::domain::conversation::ContextWindowError;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Timeout '{0}' must be greater than zero")]
    InvalidTimeout(&'static str),

    #[error("Invalid context window defaults: {0}")]
    InvalidContextWindow(#[from] ContextWindowError),

    #[error("Session idle threshold must be below the session timeout")]
    InvalidSessionThresholds,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}
