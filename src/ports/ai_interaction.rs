//! AI Interaction Port - one unified language-model call per visitor turn.
//!
//! A single request carries the windowed history, the session, the chatbot
//! configuration and the enhanced context. The response bundles the message
//! analysis, the conversation-flow reading and the generated reply, so the
//! pipeline never issues more than one model call per turn.
//!
//! # Design
//!
//! - Provider-agnostic: prompt text and wire format belong to the adapter
//! - Missing analysis fields deserialize to neutral defaults
//! - Error types for common failure modes (rate limits, timeouts, filtering)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::chatbot::ChatbotConfig;
use crate::domain::conversation::{
    ChatMessage, ConversationPhase, EngagementLevel, IntentResult, IntentType, Sentiment,
};
use crate::domain::entities::ExtractedEntity;
use crate::domain::session::ChatSession;

use super::knowledge_search::KnowledgeSearchResult;

/// Port for the unified analysis + response call.
#[async_trait]
pub trait AIInteraction: Send + Sync {
    /// Analyzes the visitor message and generates the bot reply.
    async fn process(&self, request: AIInteractionRequest) -> Result<AIInteractionResponse, AIError>;
}

/// Context gathered before the model call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancedContext {
    /// Local pre-classification of the current message.
    pub intent: Option<IntentResult>,
    /// Knowledge found for the message. `None` when no knowledge capability is configured.
    pub knowledge: Option<KnowledgeSearchResult>,
    /// True when the wider knowledge search was used.
    pub knowledge_intensive: bool,
}

/// Request for one AI interaction.
#[derive(Debug, Clone)]
pub struct AIInteractionRequest {
    /// The visitor's current message.
    pub user_message: String,
    /// Recent messages that fit the token budget, oldest first.
    pub message_history: Vec<ChatMessage>,
    /// Summary of history that no longer fits the window.
    pub conversation_summary: Option<String>,
    /// Session snapshot before this turn.
    pub session: ChatSession,
    pub chatbot_config: ChatbotConfig,
    pub enhanced_context: EnhancedContext,
    /// Tokens the response may use.
    pub max_response_tokens: u32,
}

/// Analysis of the visitor message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageAnalysis {
    pub intent: IntentType,
    /// Intent confidence (0.0 - 1.0).
    pub confidence: f64,
    pub entities: Vec<ExtractedEntity>,
    pub sentiment: Sentiment,
    pub emotional_tone: Option<String>,
    pub topics: Vec<String>,
    pub interests: Vec<String>,
}

/// Boolean signals about the conversation's direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowFlags {
    pub buying_signal: bool,
    pub ready_for_lead_capture: bool,
    pub escalation_needed: bool,
}

/// Where the conversation stands after this message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationFlow {
    pub phase: ConversationPhase,
    pub engagement_level: EngagementLevel,
    pub flags: FlowFlags,
}

/// The generated bot reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResponse {
    pub content: String,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub call_to_action: Option<String>,
}

impl GeneratedResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tone: None,
            call_to_action: None,
        }
    }
}

/// Response from one AI interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AIInteractionResponse {
    #[serde(default)]
    pub analysis: MessageAnalysis,
    #[serde(default)]
    pub conversation_flow: ConversationFlow,
    pub response: GeneratedResponse,
    #[serde(default)]
    pub usage: TokenUsage,
    /// Model that generated the response.
    pub model: String,
}

/// Token usage information for billing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Creates new token usage.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    /// Creates zero usage.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// AI interaction errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered {
        /// Reason for filtering.
        reason: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,
}

impl AIError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_secs: u32) -> Self {
        Self::Timeout { timeout_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates a content filtered error.
    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}
