//! SessionStatus enum for tracking lifecycle of visitor chat sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle status of a chat session.
///
/// `Active` and `Idle` toggle with visitor activity. `Completed`,
/// `Abandoned` and `Ended` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Idle,
    Completed,
    Abandoned,
    Ended,
}

impl SessionStatus {
    /// Returns true if the session can still accept visitor messages.
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Active | SessionStatus::Idle)
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Active, Idle)
                | (Idle, Active)
                | (Active | Idle, Completed)
                | (Active | Idle, Abandoned)
                | (Active | Idle, Ended)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Active => vec![Idle, Completed, Abandoned, Ended],
            Idle => vec![Active, Completed, Abandoned, Ended],
            Completed | Abandoned | Ended => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Active => "active",
            SessionStatus::Idle => "idle",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
            SessionStatus::Ended => "ended",
        };
        write!(f, "{}", s)
    }
}
