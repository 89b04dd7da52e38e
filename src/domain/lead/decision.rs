//! Lead-capture decision and suggested next actions.

use crate::domain::chatbot::ChatbotConfig;
use crate::domain::session::{ChatSession, QualificationStatus};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Engagement at which capture triggers on its own.
pub const HIGH_ENGAGEMENT: u8 = 70;
/// Engagement required alongside a high-value topic.
pub const TOPIC_ENGAGEMENT: u8 = 50;
/// Session length after which capture triggers.
pub const LONG_SESSION_MINUTES: i64 = 5;
/// Topics that signal buying interest.
pub const HIGH_VALUE_TOPICS: &[&str] = &["pricing", "trial", "demo", "features"];

/// Actions suggested when no rule fires.
const FALLBACK_ACTIONS: &[&str] = &["Continue conversation", "Ask clarifying questions"];

/// Outcome of the lead stage for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadDecision {
    pub should_capture_lead_info: bool,
    pub suggested_actions: Vec<String>,
}

/// What the suggested-action rules look at.
struct RuleInput<'a> {
    session: &'a ChatSession,
    config: &'a ChatbotConfig,
    should_capture: bool,
}

/// A (predicate, actions) pair. Rules are independent; every match contributes.
struct ActionRule {
    applies: fn(&RuleInput<'_>) -> bool,
    actions: &'static [&'static str],
}

const ACTION_RULES: &[ActionRule] = &[
    ActionRule {
        applies: |i| i.should_capture,
        actions: &["Request contact information", "Offer personalized follow-up"],
    },
    ActionRule {
        applies: |i| i.session.engagement_score().value() >= HIGH_ENGAGEMENT,
        actions: &["Offer product demo", "Share case studies"],
    },
    ActionRule {
        applies: |i| is_long_session(i.session),
        actions: &["Offer to schedule a call", "Summarize key points discussed"],
    },
    ActionRule {
        applies: |i| i.session.qualification_progress(i.config.total_questions()) > 0.5,
        actions: &["Complete qualification questions"],
    },
    ActionRule {
        applies: |i| i.session.context().has_topic("pricing"),
        actions: &["Share pricing information"],
    },
    ActionRule {
        applies: |i| i.session.context().has_topic("demo"),
        actions: &["Offer product demo", "Schedule a demo"],
    },
    ActionRule {
        applies: |i| i.session.context().has_topic("support"),
        actions: &["Connect with support team"],
    },
];

fn is_long_session(session: &ChatSession) -> bool {
    session.active_duration() >= Duration::minutes(LONG_SESSION_MINUTES)
}

/// Business rules deciding when to ask the visitor for contact details.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeadCaptureDecisionEngine;

impl LeadCaptureDecisionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates both the capture decision and the suggested actions.
    pub fn evaluate(&self, session: &ChatSession, config: &ChatbotConfig) -> LeadDecision {
        let should_capture = self.should_trigger_lead_capture(session, config);
        LeadDecision {
            should_capture_lead_info: should_capture,
            suggested_actions: self.generate_suggested_actions(session, config, should_capture),
        }
    }

    /// Returns true when the bot should ask for contact details this turn.
    pub fn should_trigger_lead_capture(&self, session: &ChatSession, config: &ChatbotConfig) -> bool {
        if !config.lead_capture().enabled || session.has_contact_info() {
            return false;
        }
        if matches!(
            session.lead_qualification().status(),
            QualificationStatus::InProgress | QualificationStatus::Completed
        ) {
            return false;
        }

        let engagement = session.engagement_score().value();
        if engagement >= HIGH_ENGAGEMENT || is_long_session(session) {
            return true;
        }

        let context = session.context();
        HIGH_VALUE_TOPICS.iter().any(|t| context.has_topic(t)) && engagement >= TOPIC_ENGAGEMENT
    }

    /// Concatenates the actions of every matching rule, deduplicated in order.
    pub fn generate_suggested_actions(
        &self,
        session: &ChatSession,
        config: &ChatbotConfig,
        should_capture: bool,
    ) -> Vec<String> {
        let input = RuleInput {
            session,
            config,
            should_capture,
        };

        let mut actions: Vec<String> = Vec::new();
        for rule in ACTION_RULES.iter().filter(|r| (r.applies)(&input)) {
            for action in rule.actions {
                if !actions.iter().any(|a| a == action) {
                    actions.push(action.to_string());
                }
            }
        }

        if actions.is_empty() {
            FALLBACK_ACTIONS.iter().map(|a| a.to_string()).collect()
        } else {
            actions
        }
    }
}
