//! Conversation signal vocabulary shared by analysis, flow and storage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What the visitor is trying to do with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Greeting,
    Question,
    ProductInquiry,
    PricingInquiry,
    DemoRequest,
    Support,
    Complaint,
    Objection,
    ContactShare,
    Goodbye,
    #[default]
    Unknown,
}

impl IntentType {
    /// Intents that benefit from a wider knowledge search.
    pub fn is_knowledge_seeking(&self) -> bool {
        matches!(
            self,
            IntentType::Question | IntentType::ProductInquiry | IntentType::Support
        )
    }
}

/// Overall sentiment of a message. Missing analysis defaults to neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

/// Phase of the sales conversation as judged by the AI interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    #[default]
    Greeting,
    Discovery,
    Qualification,
    Presentation,
    ObjectionHandling,
    Closing,
    Support,
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversationPhase::Greeting => "greeting",
            ConversationPhase::Discovery => "discovery",
            ConversationPhase::Qualification => "qualification",
            ConversationPhase::Presentation => "presentation",
            ConversationPhase::ObjectionHandling => "objection handling",
            ConversationPhase::Closing => "closing",
            ConversationPhase::Support => "support",
        };
        write!(f, "{}", s)
    }
}

/// Coarse engagement reading for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    Low,
    #[default]
    Medium,
    High,
}
