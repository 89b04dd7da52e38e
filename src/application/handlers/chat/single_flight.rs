//! Per-session guard against concurrent processing of the same session.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::foundation::ChatSessionId;

/// Tracks the sessions currently inside a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct SessionSingleFlight {
    in_flight: Arc<Mutex<HashSet<ChatSessionId>>>,
}

impl SessionSingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the session. Returns `None` while another run holds it.
    pub fn try_acquire(&self, session_id: ChatSessionId) -> Option<SessionPermit> {
        if !self.lock().insert(session_id) {
            return None;
        }
        Some(SessionPermit {
            session_id,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_in_flight(&self, session_id: &ChatSessionId) -> bool {
        self.lock().contains(session_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<ChatSessionId>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held for the duration of one run; releases the session on drop.
#[derive(Debug)]
pub struct SessionPermit {
    session_id: ChatSessionId,
    in_flight: Arc<Mutex<HashSet<ChatSessionId>>>,
}

impl SessionPermit {
    pub fn session_id(&self) -> &ChatSessionId {
        &self.session_id
    }
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}
