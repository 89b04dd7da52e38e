//! LeadQualificationHandler - load, transition and persist the qualification sub-state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::chatbot::ChatbotConfig;
use crate::domain::foundation::{ChatSessionId, ValidationError};
use crate::domain::session::{ChatSession, QualificationStatus};
use crate::ports::{ChatbotConfigRepository, SessionRepository};

use super::chat::ChatError;

/// A step in the qualification flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum QualificationAction {
    Start,
    Answer { question_id: String, answer: String },
    Complete,
    Skip,
}

/// Command to advance a session's lead qualification.
#[derive(Debug, Clone)]
pub struct LeadQualificationCommand {
    pub session_id: ChatSessionId,
    pub organization_id: String,
    pub action: QualificationAction,
}

/// Result of a qualification step.
#[derive(Debug, Clone)]
pub struct LeadQualificationResult {
    pub session: ChatSession,
    /// False when the step was not allowed from the current status.
    pub changed: bool,
}

/// Handler for qualification steps.
pub struct LeadQualificationHandler {
    sessions: Arc<dyn SessionRepository>,
    configs: Arc<dyn ChatbotConfigRepository>,
}

impl LeadQualificationHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        configs: Arc<dyn ChatbotConfigRepository>,
    ) -> Self {
        Self { sessions, configs }
    }

    #[tracing::instrument(skip_all, fields(session_id = %cmd.session_id))]
    pub async fn handle(
        &self,
        cmd: LeadQualificationCommand,
    ) -> Result<LeadQualificationResult, ChatError> {
        if cmd.organization_id.trim().is_empty() {
            return Err(ValidationError::empty_field("organization_id").into());
        }

        // 1. Load session and config
        let session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .ok_or(ChatError::SessionNotFound(cmd.session_id))?;
        if session.is_terminal() {
            return Err(ChatError::SessionClosed(cmd.session_id));
        }

        let config_id = session.chatbot_config_id();
        let config = self
            .configs
            .find_by_id(config_id)
            .await?
            .filter(|c| c.organization_id().as_str() == cmd.organization_id.trim())
            .ok_or_else(|| ChatError::ChatbotConfigNotFound(config_id.to_string()))?;

        // 2. Transition
        let updated = apply(session.clone(), &config, &cmd.action)?;
        let changed = updated != session;
        if !changed {
            debug!(action = ?cmd.action, status = %session.lead_qualification().status(), "qualification step not allowed");
            return Ok(LeadQualificationResult { session, changed });
        }

        // 3. Persist
        self.sessions.update(&updated).await?;

        let qualification = updated.lead_qualification();
        if qualification.status() == QualificationStatus::Completed {
            info!(
                lead_score = qualification.lead_score(),
                qualified = qualification.is_qualified(),
                "lead qualification completed"
            );
        }
        Ok(LeadQualificationResult {
            session: updated,
            changed,
        })
    }
}

fn apply(
    session: ChatSession,
    config: &ChatbotConfig,
    action: &QualificationAction,
) -> Result<ChatSession, ChatError> {
    Ok(match action {
        QualificationAction::Start => session.start_lead_qualification(),
        QualificationAction::Answer {
            question_id,
            answer,
        } => {
            let question = config
                .lead_capture()
                .qualification_questions
                .iter()
                .find(|q| q.id == *question_id)
                .ok_or_else(|| {
                    ValidationError::invalid_format("question_id", format!("unknown question '{}'", question_id))
                })?;
            session.answer_qualification_question(
                &question.id,
                &question.question,
                answer,
                question.weight,
            )
        }
        QualificationAction::Complete => session.complete_lead_qualification(),
        QualificationAction::Skip => session.skip_lead_qualification(),
    })
}
