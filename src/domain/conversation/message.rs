//! Chat message entity.
//!
//! Messages are immutable records of visitor/bot exchanges within a chat
//! session. Each carries its role, content, an estimated token count and
//! optional analysis metadata.

use crate::domain::foundation::{ChatSessionId, MessageId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};

use super::signals::{IntentType, Sentiment};

/// Tokens added to every message for the role marker.
pub const ROLE_OVERHEAD_TOKENS: u32 = 4;

/// Rough token estimate: ~4 characters per token plus the role overhead.
pub fn estimate_tokens(text: &str) -> u32 {
    let chars = text.chars().count() as u32;
    chars / 4 + ROLE_OVERHEAD_TOKENS
}

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// The website visitor.
    User,
    /// The chatbot.
    Assistant,
    /// Injected instructions or summaries.
    System,
}

/// Analysis attached to a message after processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageMetadata {
    pub intent: Option<IntentType>,
    pub confidence: Option<f64>,
    pub sentiment: Option<Sentiment>,
    pub processing_time_ms: Option<u64>,
    pub model: Option<String>,
}

/// An immutable message within a chat session.
///
/// # Invariants
///
/// - `content` is non-empty (validated at construction)
/// - `token_count` is estimated once from `content`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    id: MessageId,
    session_id: ChatSessionId,
    role: MessageRole,
    content: String,
    created_at: Timestamp,
    token_count: u32,
    #[serde(default)]
    metadata: MessageMetadata,
}

impl ChatMessage {
    /// Creates a new message.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if content is blank
    pub fn new(
        session_id: ChatSessionId,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("content"));
        }

        Ok(Self {
            id: MessageId::new(),
            session_id,
            role,
            token_count: estimate_tokens(&content),
            content,
            created_at: Timestamp::now(),
            metadata: MessageMetadata::default(),
        })
    }

    /// Creates a visitor message.
    pub fn user(session_id: ChatSessionId, content: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(session_id, MessageRole::User, content)
    }

    /// Creates a bot message.
    pub fn assistant(
        session_id: ChatSessionId,
        content: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Self::new(session_id, MessageRole::Assistant, content)
    }

    /// Creates a system message.
    pub fn system(session_id: ChatSessionId, content: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(session_id, MessageRole::System, content)
    }

    /// Returns a copy carrying the given metadata.
    pub fn with_metadata(self, metadata: MessageMetadata) -> Self {
        Self { metadata, ..self }
    }

    /// Reconstitutes a message from persistence (no validation).
    pub fn reconstitute(
        id: MessageId,
        session_id: ChatSessionId,
        role: MessageRole,
        content: String,
        created_at: Timestamp,
        metadata: MessageMetadata,
    ) -> Self {
        Self {
            id,
            session_id,
            role,
            token_count: estimate_tokens(&content),
            content,
            created_at,
            metadata,
        }
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn session_id(&self) -> &ChatSessionId {
        &self.session_id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn token_count(&self) -> u32 {
        self.token_count
    }

    pub fn metadata(&self) -> &MessageMetadata {
        &self.metadata
    }

    /// Returns true if this message is from the visitor.
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn user_creates_user_message() {
            let session = ChatSessionId::new();
            let msg = ChatMessage::user(session, "Hello").unwrap();
            assert!(msg.is_user());
            assert_eq!(msg.session_id(), &session);
            assert_eq!(msg.content(), "Hello");
        }

        #[test]
        fn rejects_whitespace_only_content() {
            let result = ChatMessage::assistant(ChatSessionId::new(), "   ");
            assert_eq!(result, Err(ValidationError::empty_field("content")));
        }

        #[test]
        fn metadata_defaults_to_empty() {
            let msg = ChatMessage::user(ChatSessionId::new(), "hi").unwrap();
            assert_eq!(msg.metadata(), &MessageMetadata::default());
        }

        #[test]
        fn with_metadata_keeps_identity() {
            let msg = ChatMessage::user(ChatSessionId::new(), "hi").unwrap();
            let id = *msg.id();
            let tagged = msg.with_metadata(MessageMetadata {
                intent: Some(IntentType::Greeting),
                ..Default::default()
            });
            assert_eq!(tagged.id(), &id);
            assert_eq!(tagged.metadata().intent, Some(IntentType::Greeting));
        }
    }

    mod tokens {
        use super::*;

        #[test]
        fn estimate_includes_role_overhead() {
            assert_eq!(estimate_tokens(""), 4);
            assert_eq!(estimate_tokens("abcdefgh"), 6);
        }

        #[test]
        fn counts_characters_not_bytes() {
            assert_eq!(estimate_tokens("éééé"), 5);
        }

        #[test]
        fn message_caches_its_estimate() {
            let msg = ChatMessage::user(ChatSessionId::new(), "a".repeat(40)).unwrap();
            assert_eq!(msg.token_count(), 14);
        }
    }

    #[test]
    fn serde_roundtrip_preserves_fields() {
        let msg = ChatMessage::user(ChatSessionId::new(), "What does it cost?").unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
