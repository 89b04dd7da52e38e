//! ExpireIdleSessionsHandler - sweeps inactive sessions.
//!
//! Sessions quiet for longer than `idle_after_minutes` are marked idle;
//! those quiet for longer than `timeout_minutes` are abandoned.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::foundation::{ChatSessionId, SessionStatus, Timestamp};
use crate::ports::SessionRepository;

use crate::application::handlers::chat::ChatError;

/// Thresholds for one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpirySettings {
    pub idle_after_minutes: u32,
    pub timeout_minutes: u32,
}

impl Default for ExpirySettings {
    fn default() -> Self {
        Self {
            idle_after_minutes: 5,
            timeout_minutes: 30,
        }
    }
}

/// Sessions changed by a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpireIdleSessionsResult {
    pub abandoned: Vec<ChatSessionId>,
    pub idled: Vec<ChatSessionId>,
}

/// Handler for expiring idle sessions.
pub struct ExpireIdleSessionsHandler {
    sessions: Arc<dyn SessionRepository>,
    settings: ExpirySettings,
}

impl ExpireIdleSessionsHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, settings: ExpirySettings) -> Self {
        Self { sessions, settings }
    }

    pub async fn handle(&self) -> Result<ExpireIdleSessionsResult, ChatError> {
        let now = Timestamp::now();
        let candidates = self
            .sessions
            .find_expired_sessions(self.settings.idle_after_minutes)
            .await?;

        let mut result = ExpireIdleSessionsResult::default();
        for session in candidates {
            let id = *session.id();
            if session.is_expired_at(&now, self.settings.timeout_minutes) {
                self.sessions.update(&session.abandon()).await?;
                result.abandoned.push(id);
            } else if session.status() == SessionStatus::Active {
                self.sessions.update(&session.mark_idle()).await?;
                result.idled.push(id);
            } else {
                debug!(session_id = %id, "session already idle");
            }
        }

        info!(
            abandoned = result.abandoned.len(),
            idled = result.idled.len(),
            "idle session sweep complete"
        );
        Ok(result)
    }
}
