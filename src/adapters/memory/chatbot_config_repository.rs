//! In-memory chatbot config repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::domain::chatbot::ChatbotConfig;
use crate::domain::foundation::{ChatbotConfigId, DomainError};
use crate::ports::ChatbotConfigRepository;

/// In-memory implementation of the ChatbotConfigRepository port.
#[derive(Debug, Default)]
pub struct InMemoryChatbotConfigRepository {
    configs: RwLock<HashMap<ChatbotConfigId, ChatbotConfig>>,
    calls: AtomicUsize,
}

impl InMemoryChatbotConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a config.
    pub async fn insert(&self, config: ChatbotConfig) {
        self.configs.write().await.insert(config.id().clone(), config);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatbotConfigRepository for InMemoryChatbotConfigRepository {
    async fn find_by_id(&self, id: &ChatbotConfigId) -> Result<Option<ChatbotConfig>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.configs.read().await.get(id).cloned())
    }
}
