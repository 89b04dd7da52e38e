//! Lead-qualification sub-state of a chat session.
//!
//! Progress moves `not_started → in_progress → {completed | skipped}`.
//! Every operation returns `None` when the state machine does not allow it,
//! so the owning session can hand back its snapshot unchanged.

use crate::domain::foundation::{EngagementScore, StateMachine, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score at or above which a lead counts as qualified.
pub const QUALIFIED_THRESHOLD: u8 = 60;

/// Share of the final score that does not depend on engagement.
const BASE_WEIGHT: f64 = 0.7;
/// Share of the final score scaled by engagement.
const ENGAGEMENT_WEIGHT: f64 = 0.3;

/// Progress of the qualification questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualificationStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Skipped,
}

impl StateMachine for QualificationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use QualificationStatus::*;
        matches!(
            (self, target),
            (NotStarted, InProgress)
                | (NotStarted, Skipped)
                | (InProgress, Completed)
                | (InProgress, Skipped)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use QualificationStatus::*;
        match self {
            NotStarted => vec![InProgress, Skipped],
            InProgress => vec![Completed, Skipped],
            Completed | Skipped => vec![],
        }
    }
}

impl fmt::Display for QualificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualificationStatus::NotStarted => "not_started",
            QualificationStatus::InProgress => "in_progress",
            QualificationStatus::Completed => "completed",
            QualificationStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// One answered qualification question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    /// Relative weight in the lead score. Never negative.
    pub weight: f64,
    pub answered_at: Timestamp,
}

impl AnsweredQuestion {
    /// Returns true if the visitor gave a non-blank answer.
    pub fn is_answered(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}

/// Qualification progress and outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LeadQualificationState {
    current_step: u32,
    answered_questions: Vec<AnsweredQuestion>,
    qualification_status: QualificationStatus,
    is_qualified: bool,
    lead_score: u8,
    captured_at: Option<Timestamp>,
}

impl LeadQualificationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn answered_questions(&self) -> &[AnsweredQuestion] {
        &self.answered_questions
    }

    pub fn status(&self) -> QualificationStatus {
        self.qualification_status
    }

    pub fn is_qualified(&self) -> bool {
        self.is_qualified
    }

    pub fn lead_score(&self) -> u8 {
        self.lead_score
    }

    pub fn captured_at(&self) -> Option<&Timestamp> {
        self.captured_at.as_ref()
    }

    /// Answered questions as a fraction of `total_questions`, capped at 1.0.
    pub fn progress(&self, total_questions: usize) -> f64 {
        if total_questions == 0 {
            return 0.0;
        }
        (self.answered_questions.len() as f64 / total_questions as f64).min(1.0)
    }

    /// Moves to `in_progress` with the step reset to 0.
    ///
    /// Calling it again while in progress restarts the step counter.
    pub fn start(self) -> Option<Self> {
        match self.qualification_status {
            QualificationStatus::InProgress => Some(Self {
                current_step: 0,
                ..self
            }),
            status => status.advance(QualificationStatus::InProgress).map(|next| Self {
                current_step: 0,
                qualification_status: next,
                ..self
            }),
        }
    }

    /// Upserts an answer by question id and advances the step.
    ///
    /// Answering while not started begins the qualification implicitly.
    pub fn answer(
        self,
        question_id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        weight: f64,
    ) -> Option<Self> {
        let mut state = match self.qualification_status {
            QualificationStatus::NotStarted => self.start()?,
            QualificationStatus::InProgress => self,
            QualificationStatus::Completed | QualificationStatus::Skipped => return None,
        };

        let entry = AnsweredQuestion {
            question_id: question_id.into(),
            question: question.into(),
            answer: answer.into(),
            weight: sanitize_weight(weight),
            answered_at: Timestamp::now(),
        };

        match state
            .answered_questions
            .iter_mut()
            .find(|q| q.question_id == entry.question_id)
        {
            Some(existing) => *existing = entry,
            None => state.answered_questions.push(entry),
        }
        state.current_step = state.current_step.saturating_add(1);

        Some(state)
    }

    /// Computes the lead score and marks the qualification completed.
    ///
    /// `base = answered weight / total weight × 100`, scaled by
    /// `0.7 + 0.3 × engagement / 100` and rounded.
    pub fn complete(self, engagement: EngagementScore) -> Option<Self> {
        let next = self
            .qualification_status
            .advance(QualificationStatus::Completed)?;

        let score = self.score(engagement);
        Some(Self {
            qualification_status: next,
            lead_score: score,
            is_qualified: score >= QUALIFIED_THRESHOLD,
            captured_at: Some(Timestamp::now()),
            ..self
        })
    }

    /// Skips qualification, leaving the lead score untouched.
    pub fn skip(self) -> Option<Self> {
        let next = self.qualification_status.advance(QualificationStatus::Skipped)?;
        Some(Self {
            qualification_status: next,
            ..self
        })
    }

    fn score(&self, engagement: EngagementScore) -> u8 {
        let total: f64 = self.answered_questions.iter().map(|q| q.weight).sum();
        let answered: f64 = self
            .answered_questions
            .iter()
            .filter(|q| q.is_answered())
            .map(|q| q.weight)
            .sum();

        let base = if total > 0.0 {
            answered / total * 100.0
        } else {
            0.0
        };
        let multiplier = BASE_WEIGHT + ENGAGEMENT_WEIGHT * engagement.as_fraction();
        (base * multiplier).round().clamp(0.0, 100.0) as u8
    }
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn in_progress() -> LeadQualificationState {
        LeadQualificationState::new().start().unwrap()
    }

    mod status_machine {
        use super::*;

        #[test]
        fn skip_bypasses_completed() {
            assert!(QualificationStatus::NotStarted.can_transition_to(&QualificationStatus::Skipped));
            assert!(QualificationStatus::InProgress.can_transition_to(&QualificationStatus::Skipped));
            assert!(!QualificationStatus::Completed.can_transition_to(&QualificationStatus::Skipped));
        }

        #[test]
        fn cannot_complete_before_starting() {
            assert!(!QualificationStatus::NotStarted.can_transition_to(&QualificationStatus::Completed));
        }

        #[test]
        fn completed_and_skipped_are_terminal() {
            assert!(QualificationStatus::Completed.is_terminal());
            assert!(QualificationStatus::Skipped.is_terminal());
            assert!(!QualificationStatus::InProgress.is_terminal());
        }

        #[test]
        fn serializes_snake_case() {
            assert_eq!(
                serde_json::to_string(&QualificationStatus::NotStarted).unwrap(),
                "\"not_started\""
            );
        }
    }

    mod start {
        use super::*;

        #[test]
        fn moves_to_in_progress() {
            let state = in_progress();
            assert_eq!(state.status(), QualificationStatus::InProgress);
            assert_eq!(state.current_step(), 0);
        }

        #[test]
        fn restart_resets_step_and_keeps_answers() {
            let state = in_progress().answer("q1", "Budget?", "$10k", 1.0).unwrap();
            let restarted = state.start().unwrap();
            assert_eq!(restarted.current_step(), 0);
            assert_eq!(restarted.answered_questions().len(), 1);
        }

        #[test]
        fn not_allowed_after_completion() {
            let done = in_progress().complete(EngagementScore::MAX).unwrap();
            assert!(done.start().is_none());
        }
    }

    mod answer {
        use super::*;

        #[test]
        fn upserts_by_question_id() {
            let state = in_progress()
                .answer("q1", "Budget?", "$10k", 1.0)
                .unwrap()
                .answer("q2", "Timeline?", "Q3", 1.0)
                .unwrap()
                .answer("q1", "Budget?", "$20k", 2.0)
                .unwrap();

            assert_eq!(state.answered_questions().len(), 2);
            assert_eq!(state.answered_questions()[0].answer, "$20k");
            assert_eq!(state.answered_questions()[0].weight, 2.0);
            assert_eq!(state.current_step(), 3);
        }

        #[test]
        fn answering_before_start_begins_qualification() {
            let state = LeadQualificationState::new()
                .answer("q1", "Budget?", "$10k", 1.0)
                .unwrap();
            assert_eq!(state.status(), QualificationStatus::InProgress);
            assert_eq!(state.current_step(), 1);
        }

        #[test]
        fn rejected_after_skip() {
            let skipped = LeadQualificationState::new().skip().unwrap();
            assert!(skipped.answer("q1", "Budget?", "$10k", 1.0).is_none());
        }

        #[test]
        fn negative_weights_count_as_zero() {
            let state = in_progress().answer("q1", "Budget?", "x", -3.0).unwrap();
            assert_eq!(state.answered_questions()[0].weight, 0.0);
        }
    }

    mod complete {
        use super::*;

        #[test]
        fn full_answers_and_full_engagement_score_100() {
            let done = in_progress()
                .answer("q1", "Budget?", "$10k", 1.0)
                .unwrap()
                .answer("q2", "Timeline?", "Q3", 1.0)
                .unwrap()
                .complete(EngagementScore::MAX)
                .unwrap();

            assert_eq!(done.lead_score(), 100);
            assert!(done.is_qualified());
            assert!(done.captured_at().is_some());
            assert_eq!(done.status(), QualificationStatus::Completed);
        }

        #[test]
        fn blank_answers_lower_the_base() {
            // base = 3/4 × 100 = 75; × (0.7 + 0.3 × 0.5) = 63.75 → 64
            let done = in_progress()
                .answer("q1", "Budget?", "$10k", 3.0)
                .unwrap()
                .answer("q2", "Timeline?", "  ", 1.0)
                .unwrap()
                .complete(EngagementScore::clamped(50))
                .unwrap();

            assert_eq!(done.lead_score(), 64);
            assert!(done.is_qualified());
        }

        #[test]
        fn zero_total_weight_scores_zero() {
            let done = in_progress().complete(EngagementScore::MAX).unwrap();
            assert_eq!(done.lead_score(), 0);
            assert!(!done.is_qualified());
        }

        #[test]
        fn requires_in_progress() {
            assert!(LeadQualificationState::new().complete(EngagementScore::MAX).is_none());
        }
    }

    mod skip {
        use super::*;

        #[test]
        fn leaves_lead_score_untouched() {
            let skipped = in_progress()
                .answer("q1", "Budget?", "$10k", 1.0)
                .unwrap()
                .skip()
                .unwrap();
            assert_eq!(skipped.status(), QualificationStatus::Skipped);
            assert_eq!(skipped.lead_score(), 0);
            assert!(!skipped.is_qualified());
        }
    }

    #[test]
    fn progress_is_capped() {
        let state = in_progress()
            .answer("q1", "a", "b", 1.0)
            .unwrap()
            .answer("q2", "a", "b", 1.0)
            .unwrap();
        assert_eq!(state.progress(4), 0.5);
        assert_eq!(state.progress(1), 1.0);
        assert_eq!(state.progress(0), 0.0);
    }

    proptest! {
        #[test]
        fn qualified_iff_score_reaches_threshold(
            weights in proptest::collection::vec((0.0f64..10.0, any::<bool>()), 0..6),
            engagement in -50i64..150,
        ) {
            let mut state = in_progress();
            for (i, (weight, answered)) in weights.iter().enumerate() {
                let answer = if *answered { "yes" } else { "" };
                state = state.answer(format!("q{}", i), "question", answer, *weight).unwrap();
            }
            let done = state.complete(EngagementScore::clamped(engagement)).unwrap();

            prop_assert!(done.lead_score() <= 100);
            prop_assert_eq!(done.is_qualified(), done.lead_score() >= QUALIFIED_THRESHOLD);
        }
    }
}
