//! Engagement scoring from per-turn flow signals.

use crate::domain::conversation::{EngagementLevel, Sentiment};
use crate::domain::foundation::EngagementScore;

/// Derives the next engagement score from one turn's signals.
///
/// The score moves by a bounded delta each turn, so a single turn cannot
/// swing it from one extreme to the other.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngagementScorer;

impl EngagementScorer {
    /// Returns `current` adjusted by the turn's engagement, sentiment and buying signal.
    pub fn next_score(
        &self,
        current: EngagementScore,
        level: EngagementLevel,
        sentiment: Sentiment,
        buying_signal: bool,
    ) -> EngagementScore {
        let level_delta = match level {
            EngagementLevel::High => 10,
            EngagementLevel::Medium => 3,
            EngagementLevel::Low => -5,
        };
        let sentiment_delta = match sentiment {
            Sentiment::Positive => 5,
            Sentiment::Neutral => 0,
            Sentiment::Negative => -5,
        };
        let signal_delta = if buying_signal { 5 } else { 0 };

        current.adjusted_by(level_delta + sentiment_delta + signal_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn high_positive_turn_with_buying_signal() {
        let next = EngagementScorer.next_score(
            EngagementScore::clamped(40),
            EngagementLevel::High,
            Sentiment::Positive,
            true,
        );
        assert_eq!(next.value(), 60);
    }

    #[test]
    fn low_negative_turn_decreases() {
        let next = EngagementScorer.next_score(
            EngagementScore::clamped(40),
            EngagementLevel::Low,
            Sentiment::Negative,
            false,
        );
        assert_eq!(next.value(), 30);
    }

    #[test]
    fn saturates_at_bounds() {
        let top = EngagementScorer.next_score(EngagementScore::MAX, EngagementLevel::High, Sentiment::Positive, true);
        let bottom = EngagementScorer.next_score(EngagementScore::ZERO, EngagementLevel::Low, Sentiment::Negative, false);
        assert_eq!(top, EngagementScore::MAX);
        assert_eq!(bottom, EngagementScore::ZERO);
    }

    proptest! {
        #[test]
        fn delta_is_bounded(start in 0i64..=100, high in any::<bool>(), signal in any::<bool>()) {
            let level = if high { EngagementLevel::High } else { EngagementLevel::Low };
            let current = EngagementScore::clamped(start);
            let next = EngagementScorer.next_score(current, level, Sentiment::Neutral, signal);
            prop_assert!((i64::from(next.value()) - start).abs() <= 20);
        }
    }
}
