//! Chat session aggregate.
//!
//! A session is created once per visitor conversation and is only changed
//! through named transitions. Every transition consumes the snapshot and
//! returns the next one; a transition the state machines do not allow hands
//! back the snapshot unchanged.

use crate::domain::conversation::ConversationPhase;
use crate::domain::entities::EntityMap;
use crate::domain::foundation::{
    ChatSessionId, ChatbotConfigId, EngagementScore, SessionStatus, SessionToken, StateMachine,
    Timestamp, ValidationError, VisitorId,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::context::{
    normalize_label, ContactInfo, CriticalMoment, JourneyStage, PageView, PhaseSummary,
    SessionContext,
};
use super::qualification::LeadQualificationState;

/// Chat session aggregate.
///
/// # Invariants
///
/// - identifiers are non-empty
/// - `ended_at` is set exactly when `status` is terminal
/// - every applied transition refreshes `last_activity_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    id: ChatSessionId,
    chatbot_config_id: ChatbotConfigId,
    visitor_id: VisitorId,
    session_token: SessionToken,
    status: SessionStatus,
    started_at: Timestamp,
    last_activity_at: Timestamp,
    ended_at: Option<Timestamp>,
    #[serde(default)]
    context_data: SessionContext,
    #[serde(default)]
    lead_qualification_state: LeadQualificationState,
}

impl ChatSession {
    /// Creates an active session with a generated session token.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if `chatbot_config_id` or `visitor_id` is blank
    pub fn create(
        chatbot_config_id: impl Into<String>,
        visitor_id: impl Into<String>,
        initial_context: Option<SessionContext>,
    ) -> Result<Self, ValidationError> {
        Self::create_with_token(
            chatbot_config_id,
            visitor_id,
            SessionToken::generate().as_str(),
            initial_context,
        )
    }

    /// Creates an active session with a caller-supplied session token.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if any identifier is blank
    pub fn create_with_token(
        chatbot_config_id: impl Into<String>,
        visitor_id: impl Into<String>,
        session_token: impl Into<String>,
        initial_context: Option<SessionContext>,
    ) -> Result<Self, ValidationError> {
        let chatbot_config_id = ChatbotConfigId::new(chatbot_config_id)?;
        let visitor_id = VisitorId::new(visitor_id)?;
        let session_token = SessionToken::new(session_token)?;

        let now = Timestamp::now();
        Ok(Self {
            id: ChatSessionId::new(),
            chatbot_config_id,
            visitor_id,
            session_token,
            status: SessionStatus::Active,
            started_at: now,
            last_activity_at: now,
            ended_at: None,
            context_data: initial_context.unwrap_or_default(),
            lead_qualification_state: LeadQualificationState::new(),
        })
    }

    /// Reconstitutes a session from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ChatSessionId,
        chatbot_config_id: ChatbotConfigId,
        visitor_id: VisitorId,
        session_token: SessionToken,
        status: SessionStatus,
        started_at: Timestamp,
        last_activity_at: Timestamp,
        ended_at: Option<Timestamp>,
        context_data: SessionContext,
        lead_qualification_state: LeadQualificationState,
    ) -> Self {
        Self {
            id,
            chatbot_config_id,
            visitor_id,
            session_token,
            status,
            started_at,
            last_activity_at,
            ended_at,
            context_data,
            lead_qualification_state,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &ChatSessionId {
        &self.id
    }

    pub fn chatbot_config_id(&self) -> &ChatbotConfigId {
        &self.chatbot_config_id
    }

    pub fn visitor_id(&self) -> &VisitorId {
        &self.visitor_id
    }

    pub fn session_token(&self) -> &SessionToken {
        &self.session_token
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    pub fn last_activity_at(&self) -> &Timestamp {
        &self.last_activity_at
    }

    pub fn ended_at(&self) -> Option<&Timestamp> {
        self.ended_at.as_ref()
    }

    pub fn context(&self) -> &SessionContext {
        &self.context_data
    }

    pub fn lead_qualification(&self) -> &LeadQualificationState {
        &self.lead_qualification_state
    }

    pub fn engagement_score(&self) -> EngagementScore {
        self.context_data.engagement_score
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// True when the session is completed, abandoned or ended.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// True if the session saw no activity for longer than `timeout_minutes`.
    ///
    /// Pure predicate: callers must transition the session themselves.
    pub fn is_expired(&self, timeout_minutes: u32) -> bool {
        self.is_expired_at(&Timestamp::now(), timeout_minutes)
    }

    /// `is_expired` evaluated at a given instant.
    pub fn is_expired_at(&self, now: &Timestamp, timeout_minutes: u32) -> bool {
        now.millis_since(&self.last_activity_at) > i64::from(timeout_minutes) * 60_000
    }

    /// True if the visitor can already be reached (email or phone captured).
    pub fn has_contact_info(&self) -> bool {
        self.context_data.contact_info.is_reachable()
    }

    /// Time between the session start and its last activity (or its end).
    pub fn active_duration(&self) -> Duration {
        let until = self.ended_at.unwrap_or(self.last_activity_at);
        until.duration_since(&self.started_at)
    }

    /// Qualification answers as a fraction of `total_questions`.
    pub fn qualification_progress(&self, total_questions: usize) -> f64 {
        self.lead_qualification_state.progress(total_questions)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Records visitor activity, reactivating an idle session.
    pub fn record_activity(self) -> Self {
        match self.status {
            SessionStatus::Active => self.touched(),
            status => match status.advance(SessionStatus::Active) {
                Some(next) => Self {
                    status: next,
                    ..self
                }
                .touched(),
                None => self,
            },
        }
    }

    /// Marks an active session idle.
    pub fn mark_idle(self) -> Self {
        self.transition(SessionStatus::Idle)
    }

    /// Terminates a session the visitor walked away from.
    pub fn abandon(self) -> Self {
        self.transition(SessionStatus::Abandoned)
    }

    /// Terminates a session explicitly closed.
    pub fn end(self) -> Self {
        self.transition(SessionStatus::Ended)
    }

    /// Terminates a session that reached its goal.
    pub fn complete(self) -> Self {
        self.transition(SessionStatus::Completed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Context transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Sets the engagement score, clamped to 0..=100.
    pub fn update_engagement_score(self, score: i64) -> Self {
        self.with_context(|c| SessionContext {
            engagement_score: EngagementScore::clamped(score),
            ..c
        })
    }

    /// Adds a topic. Blank or already-present topics leave the session unchanged.
    pub fn add_topic(self, topic: &str) -> Self {
        let topic = normalize_label(topic);
        if topic.is_empty() || self.context_data.topics.contains(&topic) {
            return self;
        }
        self.with_context(|mut c| {
            c.topics.push(topic);
            c
        })
    }

    /// Adds an interest. Blank or already-present interests leave the session unchanged.
    pub fn add_interest(self, interest: &str) -> Self {
        let interest = normalize_label(interest);
        if interest.is_empty() || self.context_data.interests.contains(&interest) {
            return self;
        }
        self.with_context(|mut c| {
            c.interests.push(interest);
            c
        })
    }

    pub fn add_page_view(self, page_view: PageView) -> Self {
        self.with_context(|mut c| {
            c.page_views.push(page_view);
            c
        })
    }

    pub fn record_return_visit(self) -> Self {
        self.with_context(|c| SessionContext {
            previous_visits: c.previous_visits.saturating_add(1),
            ..c
        })
    }

    pub fn update_conversation_summary(self, summary: impl Into<String>) -> Self {
        let summary = summary.into();
        self.with_context(|mut c| {
            c.conversation_summary.full_summary = summary;
            c
        })
    }

    pub fn add_phase_summary(self, phase_summary: PhaseSummary) -> Self {
        self.with_context(|mut c| {
            c.conversation_summary.phase_summaries.push(phase_summary);
            c
        })
    }

    pub fn add_critical_moment(self, moment: CriticalMoment) -> Self {
        self.with_context(|mut c| {
            c.conversation_summary.critical_moments.push(moment);
            c
        })
    }

    /// Replaces the accumulated entities and refreshes contact info from them.
    pub fn with_accumulated_entities(self, entities: EntityMap) -> Self {
        self.with_context(|c| {
            let contact_info = c
                .contact_info
                .merged_with(ContactInfo::from_entities(&entities));
            SessionContext {
                accumulated_entities: entities,
                contact_info,
                ..c
            }
        })
    }

    pub fn update_contact_info(self, contact_info: ContactInfo) -> Self {
        self.with_context(|c| SessionContext {
            contact_info: c.contact_info.merged_with(contact_info),
            ..c
        })
    }

    /// Moves the journey stage forward. An earlier stage leaves the session unchanged.
    pub fn update_journey_stage(self, stage: JourneyStage) -> Self {
        if stage <= self.context_data.journey_stage {
            return self;
        }
        self.with_context(|c| SessionContext {
            journey_stage: stage,
            ..c
        })
    }

    pub fn update_conversation_phase(self, phase: ConversationPhase) -> Self {
        self.with_context(|c| SessionContext {
            conversation_phase: phase,
            ..c
        })
    }

    /// Counts one processed visitor turn.
    pub fn advance_turn(self) -> Self {
        self.with_context(|c| SessionContext {
            turn_count: c.turn_count.saturating_add(1),
            ..c
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lead qualification transitions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn start_lead_qualification(self) -> Self {
        self.with_qualification(LeadQualificationState::start)
    }

    pub fn answer_qualification_question(
        self,
        question_id: &str,
        question: &str,
        answer: &str,
        weight: f64,
    ) -> Self {
        self.with_qualification(|q| q.answer(question_id, question, answer, weight))
    }

    /// Completes qualification, scoring against the current engagement.
    pub fn complete_lead_qualification(self) -> Self {
        let engagement = self.engagement_score();
        let Some(qualification) = self.lead_qualification_state.clone().complete(engagement) else {
            return self;
        };
        let lead_score = qualification.lead_score();
        Self {
            lead_qualification_state: qualification,
            context_data: SessionContext {
                lead_score,
                ..self.context_data
            },
            ..self
        }
        .touched()
    }

    pub fn skip_lead_qualification(self) -> Self {
        self.with_qualification(LeadQualificationState::skip)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn touched(self) -> Self {
        Self {
            last_activity_at: Timestamp::now(),
            ..self
        }
    }

    fn transition(self, target: SessionStatus) -> Self {
        let Some(next) = self.status.advance(target) else {
            return self;
        };
        let now = Timestamp::now();
        Self {
            status: next,
            ended_at: if next.is_terminal() { Some(now) } else { None },
            last_activity_at: now,
            ..self
        }
    }

    fn with_context(self, update: impl FnOnce(SessionContext) -> SessionContext) -> Self {
        let context_data = update(self.context_data);
        Self {
            context_data,
            ..self
        }
        .touched()
    }

    fn with_qualification(
        self,
        update: impl FnOnce(LeadQualificationState) -> Option<LeadQualificationState>,
    ) -> Self {
        match update(self.lead_qualification_state.clone()) {
            Some(lead_qualification_state) => Self {
                lead_qualification_state,
                ..self
            }
            .touched(),
            None => self,
        }
    }
}
