//! State machine trait for status enums.
//!
//! Session lifecycle and lead-qualification progress both implement this
//! trait so transitions are checked in one place.

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get `is_terminal`
/// and `advance` for free.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns the target when the transition is allowed, otherwise `None`.
    ///
    /// Entity mutators are total, so callers treat `None` as "leave unchanged".
    fn advance(&self, target: Self) -> Option<Self> {
        self.can_transition_to(&target).then_some(target)
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
