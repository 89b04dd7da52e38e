//! In-memory message repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::conversation::ChatMessage;
use crate::domain::foundation::{ChatSessionId, DomainError};
use crate::ports::MessageRepository;

/// In-memory implementation of the MessageRepository port.
///
/// Messages are kept per session in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<HashMap<ChatSessionId, Vec<ChatMessage>>>,
    calls: AtomicUsize,
    fail_saves: AtomicBool,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a message directly, bypassing the port and its counter.
    pub async fn insert(&self, message: ChatMessage) {
        self.messages
            .write()
            .await
            .entry(*message.session_id())
            .or_default()
            .push(message);
    }

    pub async fn messages_for(&self, session_id: &ChatSessionId) -> Vec<ChatMessage> {
        self.messages
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every subsequent `save` fail with a database error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn find_by_session_id(&self, session_id: &ChatSessionId) -> Result<Vec<ChatMessage>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.messages_for(session_id).await)
    }

    async fn save(&self, message: &ChatMessage) -> Result<(), DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DomainError::database("message store unavailable"));
        }
        self.insert(message.clone()).await;
        Ok(())
    }

    async fn find_last_by_session_id(
        &self,
        session_id: &ChatSessionId,
    ) -> Result<Option<ChatMessage>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .messages
            .read()
            .await
            .get(session_id)
            .and_then(|m| m.last().cloned()))
    }
}
