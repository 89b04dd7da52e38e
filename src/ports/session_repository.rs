//! Chat session repository port.
//!
//! Defines the contract for persisting and retrieving `ChatSession`
//! aggregates. The `update` call is the durability point of a pipeline run.

use crate::domain::foundation::{ChatSessionId, DomainError};
use crate::domain::session::ChatSession;
use async_trait::async_trait;

/// Repository port for chat session persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Find a session by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &ChatSessionId) -> Result<Option<ChatSession>, DomainError>;

    /// Save a new session.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, session: &ChatSession) -> Result<(), DomainError>;

    /// Update an existing session.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if session doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, session: &ChatSession) -> Result<(), DomainError>;

    /// Find open sessions with no activity for longer than `timeout_minutes`.
    ///
    /// Terminal sessions are never returned.
    async fn find_expired_sessions(&self, timeout_minutes: u32) -> Result<Vec<ChatSession>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SessionRepository) {}
    }
}
