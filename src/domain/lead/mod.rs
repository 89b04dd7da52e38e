//! Lead-capture rules and engagement scoring.

mod decision;
mod engagement;

pub use decision::{
    LeadCaptureDecisionEngine, LeadDecision, HIGH_ENGAGEMENT, HIGH_VALUE_TOPICS,
    LONG_SESSION_MINUTES, TOPIC_ENGAGEMENT,
};
pub use engagement::EngagementScorer;
