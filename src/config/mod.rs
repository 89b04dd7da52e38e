//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `LEADCHAT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use leadchat::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("AI timeout: {:?}", config.pipeline.ai_timeout());
//! ```

mod context_window;
mod error;
mod logging;
mod pipeline;
mod session;

pub use context_window::ContextWindowConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use pipeline::PipelineConfig;
pub use session::SessionConfig;

use serde::Deserialize;

use crate::application::{ExpirySettings, PipelineSettings};

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// configuration. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Pipeline timeouts and the single-flight guard
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Default token budget
    #[serde(default)]
    pub context_window: ContextWindowConfig,

    /// Session inactivity thresholds
    #[serde(default)]
    pub session: SessionConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `LEADCHAT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `LEADCHAT__PIPELINE__AI_TIMEOUT_SECS=30` -> `pipeline.ai_timeout_secs = 30`
    /// - `LEADCHAT__LOGGING__JSON=true` -> `logging.json = true`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LEADCHAT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any timeout is zero, the session thresholds
    /// are inverted, the budget defaults do not fit or the log level is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pipeline.validate()?;
        self.context_window.validate()?;
        self.session.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Settings for a `MessageProcessingPipeline`
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            ai_timeout: self.pipeline.ai_timeout(),
            knowledge_timeout: self.pipeline.knowledge_timeout(),
            repository_timeout: self.pipeline.repository_timeout(),
            context_window: self.context_window.settings(),
            single_flight: self.pipeline.single_flight,
        }
    }

    /// Settings for an `ExpireIdleSessionsHandler`
    pub fn expiry_settings(&self) -> ExpirySettings {
        ExpirySettings {
            idle_after_minutes: self.session.idle_after_minutes,
            timeout_minutes: self.session.timeout_minutes,
        }
    }
}
