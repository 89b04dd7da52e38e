//! Chat session domain module.
//!
//! The `ChatSession` aggregate with its conversational context and the
//! lead-qualification sub-state. Both the session lifecycle and the
//! qualification progress are state machines; transitions consume the
//! current snapshot and return the next one.

mod aggregate;
mod context;
mod qualification;

pub use aggregate::ChatSession;
pub use context::{
    ContactInfo, ConversationSummary, CriticalMoment, JourneyStage, PageView, PhaseSummary,
    SessionContext,
};
pub use qualification::{
    AnsweredQuestion, LeadQualificationState, QualificationStatus, QUALIFIED_THRESHOLD,
};
