//! Error tracking adapters.
//!
//! - `TracingErrorTracker` emits each tracked error as a `tracing` event
//! - `InMemoryErrorTracker` records them for inspection in tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::error;

use crate::ports::{ErrorContext, ErrorTracking, ErrorTrackingError};

/// Reports tracked errors through `tracing::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorTracker;

impl TracingErrorTracker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ErrorTracking for TracingErrorTracker {
    async fn track_error(&self, message: &str, context: ErrorContext) -> Result<(), ErrorTrackingError> {
        error!(
            target: "leadchat::error_tracking",
            session_id = context.session_id.as_deref().unwrap_or("-"),
            organization_id = context.organization_id.as_deref().unwrap_or("-"),
            error_code = context.error_code.as_deref().unwrap_or("-"),
            elapsed_ms = context.elapsed_ms,
            user_message = context.user_message.as_deref().unwrap_or(""),
            "{}",
            message
        );
        Ok(())
    }
}

/// Keeps tracked errors in memory.
#[derive(Debug, Default)]
pub struct InMemoryErrorTracker {
    recorded: Mutex<Vec<(String, ErrorContext)>>,
    fail: AtomicBool,
}

impl InMemoryErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker whose every call fails without recording.
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Self::default()
        }
    }

    /// Returns all tracked (message, context) pairs in order.
    pub fn recorded(&self) -> Vec<(String, ErrorContext)> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ErrorTracking for InMemoryErrorTracker {
    async fn track_error(&self, message: &str, context: ErrorContext) -> Result<(), ErrorTrackingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ErrorTrackingError::Unavailable("tracker offline".to_string()));
        }
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((message.to_string(), context));
        Ok(())
    }
}
