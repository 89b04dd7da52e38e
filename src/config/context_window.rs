//! Default token budget configuration

use serde::Deserialize;

use crate::domain::conversation::{
    ContextWindowSettings, ConversationContextWindow, DEFAULT_MAX_TOKENS,
    DEFAULT_RESPONSE_RESERVED_TOKENS, DEFAULT_SUMMARY_TOKENS, DEFAULT_SYSTEM_PROMPT_TOKENS,
};

use super::error::ValidationError;

/// Token budget applied when a chatbot sets no overrides
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct ContextWindowConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_system_prompt_tokens")]
    pub system_prompt_tokens: u32,

    #[serde(default = "default_response_reserved_tokens")]
    pub response_reserved_tokens: u32,

    #[serde(default = "default_summary_tokens")]
    pub summary_tokens: u32,
}

impl ContextWindowConfig {
    pub fn settings(&self) -> ContextWindowSettings {
        ContextWindowSettings {
            max_tokens: Some(self.max_tokens),
            system_prompt_tokens: Some(self.system_prompt_tokens),
            response_reserved_tokens: Some(self.response_reserved_tokens),
            summary_tokens: Some(self.summary_tokens),
        }
    }

    /// The defaults must form a valid budget on their own
    pub fn validate(&self) -> Result<(), ValidationError> {
        ConversationContextWindow::create(Some(&self.settings()))?;
        Ok(())
    }
}

impl Default for ContextWindowConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            system_prompt_tokens: default_system_prompt_tokens(),
            response_reserved_tokens: default_response_reserved_tokens(),
            summary_tokens: default_summary_tokens(),
        }
    }
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_system_prompt_tokens() -> u32 {
    DEFAULT_SYSTEM_PROMPT_TOKENS
}

fn default_response_reserved_tokens() -> u32 {
    DEFAULT_RESPONSE_RESERVED_TOKENS
}

fn default_summary_tokens() -> u32 {
    DEFAULT_SUMMARY_TOKENS
}
