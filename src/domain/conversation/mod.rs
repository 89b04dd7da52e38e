//! Conversation domain module.
//!
//! Messages, the token budget applied to them, and the signal vocabulary
//! (intent, sentiment, phase) that flows between analysis and session state.

mod context_window;
mod intent;
mod message;
mod signals;
mod window;

pub use context_window::{
    ContextWindowError, ContextWindowSettings, ConversationContextWindow, TokenAllocation,
    DEFAULT_MAX_TOKENS, DEFAULT_RESPONSE_RESERVED_TOKENS, DEFAULT_SUMMARY_TOKENS,
    DEFAULT_SYSTEM_PROMPT_TOKENS,
};
pub use intent::{IntentClassifier, IntentResult, RuleBasedIntentClassifier};
pub use message::{estimate_tokens, ChatMessage, MessageMetadata, MessageRole, ROLE_OVERHEAD_TOKENS};
pub use signals::{ConversationPhase, EngagementLevel, IntentType, Sentiment};
pub use window::{MessageWindow, MessageWindowBuilder};
