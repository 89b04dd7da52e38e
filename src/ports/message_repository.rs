//! Chat message repository port.

use crate::domain::conversation::ChatMessage;
use crate::domain::foundation::{ChatSessionId, DomainError};
use async_trait::async_trait;

/// Repository port for chat message persistence.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// All messages of a session, oldest first.
    async fn find_by_session_id(&self, session_id: &ChatSessionId) -> Result<Vec<ChatMessage>, DomainError>;

    /// Save a message.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, message: &ChatMessage) -> Result<(), DomainError>;

    /// The newest message of a session, if any.
    async fn find_last_by_session_id(
        &self,
        session_id: &ChatSessionId,
    ) -> Result<Option<ChatMessage>, DomainError>;
}
