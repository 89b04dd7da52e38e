//! Engagement score value object (0-100 scale).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Visitor engagement on a 0..=100 scale.
///
/// Every constructor clamps, so an out-of-range score cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EngagementScore(u8);

impl EngagementScore {
    /// Zero engagement.
    pub const ZERO: Self = Self(0);

    /// Maximum engagement.
    pub const MAX: Self = Self(100);

    /// Creates a score from any integer, clamping to 0..=100.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    /// Returns the value as u8.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns the value as a fraction (0.0 to 1.0).
    pub fn as_fraction(&self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Returns a new score shifted by `delta`, clamped.
    pub fn adjusted_by(&self, delta: i64) -> Self {
        Self::clamped(i64::from(self.0).saturating_add(delta))
    }
}

impl Default for EngagementScore {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<'de> Deserialize<'de> for EngagementScore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Ok(Self::clamped(raw))
    }
}

impl fmt::Display for EngagementScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamped_keeps_in_range_values() {
        assert_eq!(EngagementScore::clamped(0).value(), 0);
        assert_eq!(EngagementScore::clamped(42).value(), 42);
        assert_eq!(EngagementScore::clamped(100).value(), 100);
    }

    #[test]
    fn clamped_pins_out_of_range_values() {
        assert_eq!(EngagementScore::clamped(-5).value(), 0);
        assert_eq!(EngagementScore::clamped(250).value(), 100);
        assert_eq!(EngagementScore::clamped(i64::MIN).value(), 0);
        assert_eq!(EngagementScore::clamped(i64::MAX).value(), 100);
    }

    #[test]
    fn adjusted_by_saturates() {
        assert_eq!(EngagementScore::clamped(95).adjusted_by(20), EngagementScore::MAX);
        assert_eq!(EngagementScore::clamped(5).adjusted_by(-20), EngagementScore::ZERO);
    }

    #[test]
    fn deserialization_clamps() {
        let score: EngagementScore = serde_json::from_str("130").unwrap();
        assert_eq!(score.value(), 100);
    }

    proptest! {
        #[test]
        fn adjusted_by_never_leaves_range(start in 0i64..=100, delta in any::<i32>()) {
            let score = EngagementScore::clamped(start).adjusted_by(i64::from(delta));
            prop_assert!(score.value() <= 100);
        }
    }
}
