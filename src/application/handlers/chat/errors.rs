//! Errors reported by the chat pipeline and its handlers.

use thiserror::Error;

use crate::domain::conversation::ContextWindowError;
use crate::domain::foundation::{ChatSessionId, DomainError, ErrorCode, ValidationError};
use crate::ports::{AIError, KnowledgeSearchError};

/// Coarse classification callers use to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad input. Nothing was read or written.
    Validation,
    /// Invalid token-budget configuration.
    Configuration,
    /// An external capability failed. Retryable by the caller.
    Upstream,
    /// Session or chatbot config missing (or closed).
    NotFound,
    /// A conflicting concurrent update.
    Consistency,
}

/// The single error type of a chat turn.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid context window configuration: {0}")]
    Configuration(#[from] ContextWindowError),

    #[error("AI interaction failed: {0}")]
    AIInteraction(#[from] AIError),

    #[error("Knowledge search failed: {0}")]
    KnowledgeSearch(#[from] KnowledgeSearchError),

    #[error("Repository error: {0}")]
    Repository(#[from] DomainError),

    #[error("Repository call timed out after {timeout_secs}s")]
    RepositoryTimeout { timeout_secs: u32 },

    #[error("Chat session not found: {0}")]
    SessionNotFound(ChatSessionId),

    #[error("Chatbot config not found: {0}")]
    ChatbotConfigNotFound(String),

    #[error("Chat session {0} is closed")]
    SessionClosed(ChatSessionId),

    #[error("Chat session {0} is already processing a message")]
    ConcurrentRequest(ChatSessionId),
}

impl ChatError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::Validation(_) => ErrorCategory::Validation,
            ChatError::Configuration(_) => ErrorCategory::Configuration,
            ChatError::AIInteraction(_)
            | ChatError::KnowledgeSearch(_)
            | ChatError::RepositoryTimeout { .. } => ErrorCategory::Upstream,
            ChatError::Repository(err) => match err.code {
                ErrorCode::SessionNotFound | ErrorCode::ChatbotConfigNotFound => {
                    ErrorCategory::NotFound
                }
                ErrorCode::ConcurrentModification => ErrorCategory::Consistency,
                ErrorCode::ValidationFailed => ErrorCategory::Validation,
                _ => ErrorCategory::Upstream,
            },
            ChatError::SessionNotFound(_)
            | ChatError::ChatbotConfigNotFound(_)
            | ChatError::SessionClosed(_) => ErrorCategory::NotFound,
            ChatError::ConcurrentRequest(_) => ErrorCategory::Consistency,
        }
    }

    /// True when repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::AIInteraction(err) => err.is_retryable(),
            ChatError::KnowledgeSearch(err) => err.is_retryable(),
            _ => matches!(
                self.category(),
                ErrorCategory::Upstream | ErrorCategory::Consistency
            ),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ChatError::Validation(_) => ErrorCode::ValidationFailed,
            ChatError::Configuration(_) => ErrorCode::InvalidConfiguration,
            ChatError::AIInteraction(AIError::Timeout { .. }) => ErrorCode::AITimeout,
            ChatError::AIInteraction(_) => ErrorCode::AIProviderError,
            ChatError::KnowledgeSearch(_) => ErrorCode::KnowledgeSearchError,
            ChatError::Repository(err) => err.code,
            ChatError::RepositoryTimeout { .. } => ErrorCode::DatabaseError,
            ChatError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            ChatError::ChatbotConfigNotFound(_) => ErrorCode::ChatbotConfigNotFound,
            ChatError::SessionClosed(_) => ErrorCode::SessionClosed,
            ChatError::ConcurrentRequest(_) => ErrorCode::ConcurrentModification,
        }
    }
}
