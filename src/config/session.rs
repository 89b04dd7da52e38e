//! Session lifecycle configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Inactivity thresholds for chat sessions
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Minutes of inactivity after which a session is abandoned
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u32,

    /// Minutes of inactivity after which a session is marked idle
    #[serde(default = "default_idle_after_minutes")]
    pub idle_after_minutes: u32,
}

impl SessionConfig {
    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_minutes == 0 {
            return Err(ValidationError::InvalidTimeout("session.timeout_minutes"));
        }
        if self.idle_after_minutes == 0 {
            return Err(ValidationError::InvalidTimeout("session.idle_after_minutes"));
        }
        if self.idle_after_minutes >= self.timeout_minutes {
            return Err(ValidationError::InvalidSessionThresholds);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: default_timeout_minutes(),
            idle_after_minutes: default_idle_after_minutes(),
        }
    }
}

fn default_timeout_minutes() -> u32 {
    30
}

fn default_idle_after_minutes() -> u32 {
    5
}
