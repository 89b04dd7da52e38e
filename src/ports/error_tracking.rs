//! Error Tracking Port - best-effort reporting of failed turns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Port for recording pipeline failures.
///
/// Callers treat tracking as best effort: a tracking failure is logged and
/// never replaces the error being tracked.
#[async_trait]
pub trait ErrorTracking: Send + Sync {
    async fn track_error(&self, message: &str, context: ErrorContext) -> Result<(), ErrorTrackingError>;
}

/// Where and when a tracked error happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub session_id: Option<String>,
    pub organization_id: Option<String>,
    /// Machine-readable error code, e.g. "AI_TIMEOUT".
    pub error_code: Option<String>,
    pub elapsed_ms: u64,
    /// Visitor message, truncated.
    pub user_message: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

/// Error tracking failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorTrackingError {
    #[error("error tracker unavailable: {0}")]
    Unavailable(String),
}
