//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the chat session domain.

mod engagement_score;
mod errors;
mod ids;
mod session_status;
mod state_machine;
mod timestamp;

pub use engagement_score::EngagementScore;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ChatSessionId, ChatbotConfigId, MessageId, OrganizationId, SessionToken, VisitorId};
pub use session_status::SessionStatus;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
