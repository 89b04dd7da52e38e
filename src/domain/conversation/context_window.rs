//! Token budget for the conversation window sent to the language model.
//!
//! The window reserves fixed slices for the system prompt, the running
//! conversation summary and the model's response. Whatever remains is the
//! budget for recent messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default total context size.
pub const DEFAULT_MAX_TOKENS: u32 = 12_000;
/// Default system prompt reservation.
pub const DEFAULT_SYSTEM_PROMPT_TOKENS: u32 = 500;
/// Default response reservation.
pub const DEFAULT_RESPONSE_RESERVED_TOKENS: u32 = 1_000;
/// Default conversation summary reservation.
pub const DEFAULT_SUMMARY_TOKENS: u32 = 200;

/// Invalid token-budget configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextWindowError {
    #[error("reserved tokens ({reserved}) exceed max tokens ({max_tokens})")]
    ReservedExceedsMax { reserved: u64, max_tokens: u32 },
}

/// Partial overrides for a context window. Unset fields take defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextWindowSettings {
    pub max_tokens: Option<u32>,
    pub system_prompt_tokens: Option<u32>,
    pub response_reserved_tokens: Option<u32>,
    pub summary_tokens: Option<u32>,
}

/// How the window's tokens are split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAllocation {
    pub system_prompt: u32,
    pub conversation_summary: u32,
    pub recent_messages: u32,
    pub response_reserved: u32,
    pub total: u32,
}

/// Immutable token budget for one pipeline run.
///
/// # Invariants
///
/// - `system_prompt_tokens + response_reserved_tokens + summary_tokens <= max_tokens`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversationContextWindow {
    max_tokens: u32,
    system_prompt_tokens: u32,
    response_reserved_tokens: u32,
    summary_tokens: u32,
}

impl ConversationContextWindow {
    /// Builds a window from optional overrides, validating the reserved sum.
    ///
    /// # Errors
    ///
    /// - `ReservedExceedsMax` if the reserved slices do not fit in `max_tokens`
    pub fn create(settings: Option<&ContextWindowSettings>) -> Result<Self, ContextWindowError> {
        let settings = settings.copied().unwrap_or_default();
        let window = Self {
            max_tokens: settings.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system_prompt_tokens: settings
                .system_prompt_tokens
                .unwrap_or(DEFAULT_SYSTEM_PROMPT_TOKENS),
            response_reserved_tokens: settings
                .response_reserved_tokens
                .unwrap_or(DEFAULT_RESPONSE_RESERVED_TOKENS),
            summary_tokens: settings.summary_tokens.unwrap_or(DEFAULT_SUMMARY_TOKENS),
        };

        let reserved = window.reserved_tokens();
        if reserved > u64::from(window.max_tokens) {
            return Err(ContextWindowError::ReservedExceedsMax {
                reserved,
                max_tokens: window.max_tokens,
            });
        }

        Ok(window)
    }

    /// Total context size.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Tokens reserved for the system prompt.
    pub fn system_prompt_tokens(&self) -> u32 {
        self.system_prompt_tokens
    }

    /// Tokens reserved for the model's response.
    pub fn response_reserved_tokens(&self) -> u32 {
        self.response_reserved_tokens
    }

    /// Tokens reserved for the conversation summary.
    pub fn summary_tokens(&self) -> u32 {
        self.summary_tokens
    }

    /// Tokens left for recent messages once every reservation is taken.
    pub fn available_tokens_for_messages(&self) -> u32 {
        let available = u64::from(self.max_tokens).saturating_sub(self.reserved_tokens());
        available as u32
    }

    /// Returns the full split of the window.
    pub fn allocation(&self) -> TokenAllocation {
        TokenAllocation {
            system_prompt: self.system_prompt_tokens,
            conversation_summary: self.summary_tokens,
            recent_messages: self.available_tokens_for_messages(),
            response_reserved: self.response_reserved_tokens,
            total: self.max_tokens,
        }
    }

    /// True when the history no longer fits in the message budget.
    pub fn should_summarize(&self, current_tokens: u32) -> bool {
        current_tokens > self.available_tokens_for_messages()
    }

    /// How many of the oldest tokens to fold into the summary.
    ///
    /// The overflow is multiplied by 1.5 (rounded up) so the next turn does
    /// not immediately cross the limit again.
    pub fn tokens_to_summarize(&self, current_tokens: u32) -> u32 {
        let excess = u64::from(current_tokens.saturating_sub(self.available_tokens_for_messages()));
        let with_buffer = (excess * 3 + 1) / 2;
        with_buffer.min(u64::from(u32::MAX)) as u32
    }

    fn reserved_tokens(&self) -> u64 {
        u64::from(self.system_prompt_tokens)
            + u64::from(self.response_reserved_tokens)
            + u64::from(self.summary_tokens)
    }
}

impl Default for ConversationContextWindow {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt_tokens: DEFAULT_SYSTEM_PROMPT_TOKENS,
            response_reserved_tokens: DEFAULT_RESPONSE_RESERVED_TOKENS,
            summary_tokens: DEFAULT_SUMMARY_TOKENS,
        }
    }
}
