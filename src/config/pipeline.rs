//! Message pipeline configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Timeouts and guards for the message pipeline
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Unified AI interaction timeout in seconds
    #[serde(default = "default_ai_timeout")]
    pub ai_timeout_secs: u64,

    /// Knowledge search timeout in seconds
    #[serde(default = "default_io_timeout")]
    pub knowledge_timeout_secs: u64,

    /// Per-call repository timeout in seconds
    #[serde(default = "default_io_timeout")]
    pub repository_timeout_secs: u64,

    /// Reject concurrent messages for the same session
    #[serde(default = "default_single_flight")]
    pub single_flight: bool,
}

impl PipelineConfig {
    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    pub fn knowledge_timeout(&self) -> Duration {
        Duration::from_secs(self.knowledge_timeout_secs)
    }

    pub fn repository_timeout(&self) -> Duration {
        Duration::from_secs(self.repository_timeout_secs)
    }

    /// Validate pipeline configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ai_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("pipeline.ai_timeout_secs"));
        }
        if self.knowledge_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("pipeline.knowledge_timeout_secs"));
        }
        if self.repository_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("pipeline.repository_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ai_timeout_secs: default_ai_timeout(),
            knowledge_timeout_secs: default_io_timeout(),
            repository_timeout_secs: default_io_timeout(),
            single_flight: default_single_flight(),
        }
    }
}

fn default_ai_timeout() -> u64 {
    30
}

fn default_io_timeout() -> u64 {
    5
}

fn default_single_flight() -> bool {
    true
}
