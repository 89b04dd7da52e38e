//! Chatbot configuration repository port (read side).

use crate::domain::chatbot::ChatbotConfig;
use crate::domain::foundation::{ChatbotConfigId, DomainError};
use async_trait::async_trait;

/// Read access to chatbot configurations.
#[async_trait]
pub trait ChatbotConfigRepository: Send + Sync {
    /// Find a config by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &ChatbotConfigId) -> Result<Option<ChatbotConfig>, DomainError>;
}
