//! Per-session conversational context.

use crate::domain::conversation::ConversationPhase;
use crate::domain::entities::EntityMap;
use crate::domain::foundation::{EngagementScore, Timestamp};
use serde::{Deserialize, Serialize};

/// A page the visitor viewed before or during the chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub url: String,
    pub title: Option<String>,
    pub viewed_at: Timestamp,
    pub time_on_page_secs: Option<u32>,
}

impl PageView {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            viewed_at: Timestamp::now(),
            time_on_page_secs: None,
        }
    }
}

/// Summary of one conversation phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub phase: ConversationPhase,
    pub summary: String,
    pub recorded_at: Timestamp,
}

/// A turn worth remembering, e.g. an objection or a buying signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalMoment {
    pub turn: u32,
    pub description: String,
    /// Importance (0.0 - 1.0).
    pub importance: f64,
}

/// Rolling summary of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSummary {
    pub full_summary: String,
    pub phase_summaries: Vec<PhaseSummary>,
    pub critical_moments: Vec<CriticalMoment>,
}

impl ConversationSummary {
    pub fn is_empty(&self) -> bool {
        self.full_summary.is_empty()
            && self.phase_summaries.is_empty()
            && self.critical_moments.is_empty()
    }
}

/// Visitor contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

impl ContactInfo {
    /// Reads contact fields out of accumulated entities.
    pub fn from_entities(entities: &EntityMap) -> Self {
        let field = |key: &str| {
            entities
                .get(key)
                .and_then(|e| e.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            name: field("name"),
            email: field("email"),
            phone: field("phone"),
            company: field("company"),
        }
    }

    /// True when the visitor can be reached (email or phone).
    pub fn is_reachable(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }

    /// Fields set in `newer` win; unset fields keep the current value.
    pub fn merged_with(self, newer: ContactInfo) -> Self {
        Self {
            name: newer.name.or(self.name),
            email: newer.email.or(self.email),
            phone: newer.phone.or(self.phone),
            company: newer.company.or(self.company),
        }
    }
}

/// Where the visitor is in the buying journey. Ordered; never regresses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStage {
    #[default]
    Awareness,
    Consideration,
    Decision,
    Retention,
}

impl JourneyStage {
    /// The stage a conversation phase signals.
    pub fn from_phase(phase: ConversationPhase) -> Self {
        match phase {
            ConversationPhase::Greeting | ConversationPhase::Discovery => Self::Awareness,
            ConversationPhase::Qualification | ConversationPhase::Presentation => {
                Self::Consideration
            }
            ConversationPhase::ObjectionHandling | ConversationPhase::Closing => Self::Decision,
            ConversationPhase::Support => Self::Retention,
        }
    }
}

/// Everything the bot knows about the visitor in this session.
///
/// # Invariants
///
/// - `engagement_score` is within 0..=100
/// - `topics` and `interests` hold no duplicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionContext {
    pub previous_visits: u32,
    pub page_views: Vec<PageView>,
    pub conversation_summary: ConversationSummary,
    pub topics: Vec<String>,
    pub interests: Vec<String>,
    pub engagement_score: EngagementScore,
    pub accumulated_entities: EntityMap,
    pub lead_score: u8,
    pub contact_info: ContactInfo,
    pub journey_stage: JourneyStage,
    pub conversation_phase: ConversationPhase,
    pub turn_count: u32,
}

impl SessionContext {
    /// True if the normalized topic is already recorded.
    pub fn has_topic(&self, topic: &str) -> bool {
        let normalized = normalize_label(topic);
        self.topics.iter().any(|t| *t == normalized)
    }
}

/// Canonical form of a topic or interest label.
pub(crate) fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}
