//! In-memory session repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::foundation::{ChatSessionId, DomainError, ErrorCode};
use crate::domain::session::ChatSession;
use crate::ports::SessionRepository;

/// In-memory implementation of the SessionRepository port.
///
/// Counts port calls so tests can assert that nothing was touched.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<ChatSessionId, ChatSession>>,
    calls: AtomicUsize,
    updates: AtomicUsize,
    fail_updates: AtomicBool,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session directly, bypassing the port and its counters.
    pub async fn insert(&self, session: ChatSession) {
        self.sessions.write().await.insert(*session.id(), session);
    }

    pub async fn get(&self, id: &ChatSessionId) -> Option<ChatSession> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Port calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Successful `update` calls made so far.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Makes every subsequent `update` fail with a database error.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_by_id(&self, id: &ChatSessionId) -> Result<Option<ChatSession>, DomainError> {
        self.record_call();
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn save(&self, session: &ChatSession) -> Result<(), DomainError> {
        self.record_call();
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(DomainError::new(
                ErrorCode::ConcurrentModification,
                format!("Session {} already exists", session.id()),
            ));
        }
        sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn update(&self, session: &ChatSession) -> Result<(), DomainError> {
        self.record_call();
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(DomainError::database("session store unavailable"));
        }
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session.id()) {
            Some(stored) => {
                *stored = session.clone();
                self.updates.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session {} not found", session.id()),
            )),
        }
    }

    async fn find_expired_sessions(&self, timeout_minutes: u32) -> Result<Vec<ChatSession>, DomainError> {
        self.record_call();
        let mut expired: Vec<ChatSession> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| !s.is_terminal() && s.is_expired(timeout_minutes))
            .cloned()
            .collect();
        expired.sort_by_key(|s| *s.last_activity_at());
        Ok(expired)
    }
}
