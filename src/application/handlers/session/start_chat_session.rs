//! StartChatSessionHandler - Command handler for opening a visitor chat session.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{ChatbotConfigId, OrganizationId};
use crate::domain::session::{ChatSession, PageView, SessionContext};
use crate::ports::{ChatbotConfigRepository, SessionRepository};

use crate::application::handlers::chat::ChatError;

/// Command to start a chat session.
#[derive(Debug, Clone)]
pub struct StartChatSessionCommand {
    pub chatbot_config_id: String,
    pub organization_id: String,
    pub visitor_id: String,
    /// Token issued to the widget; generated when absent.
    pub session_token: Option<String>,
    /// Visitor has chatted with this bot before.
    pub returning_visitor: bool,
    pub landing_page: Option<String>,
}

impl StartChatSessionCommand {
    pub fn new(
        chatbot_config_id: impl Into<String>,
        organization_id: impl Into<String>,
        visitor_id: impl Into<String>,
    ) -> Self {
        Self {
            chatbot_config_id: chatbot_config_id.into(),
            organization_id: organization_id.into(),
            visitor_id: visitor_id.into(),
            session_token: None,
            returning_visitor: false,
            landing_page: None,
        }
    }
}

/// Handler for starting chat sessions.
pub struct StartChatSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    configs: Arc<dyn ChatbotConfigRepository>,
}

impl StartChatSessionHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        configs: Arc<dyn ChatbotConfigRepository>,
    ) -> Self {
        Self { sessions, configs }
    }

    pub async fn handle(&self, cmd: StartChatSessionCommand) -> Result<ChatSession, ChatError> {
        // 1. Validate identifiers
        let config_id = ChatbotConfigId::new(cmd.chatbot_config_id)?;
        let organization_id = OrganizationId::new(cmd.organization_id)?;

        // 2. The config must exist, be active and belong to the organization
        self.configs
            .find_by_id(&config_id)
            .await?
            .filter(|c| c.is_active() && c.belongs_to(&organization_id))
            .ok_or_else(|| ChatError::ChatbotConfigNotFound(config_id.to_string()))?;

        // 3. Create session aggregate
        let context = SessionContext {
            page_views: cmd.landing_page.map(PageView::new).into_iter().collect(),
            ..Default::default()
        };
        let session = match cmd.session_token {
            Some(token) => {
                ChatSession::create_with_token(config_id.as_str(), cmd.visitor_id, token, Some(context))?
            }
            None => ChatSession::create(config_id.as_str(), cmd.visitor_id, Some(context))?,
        };
        let session = if cmd.returning_visitor {
            session.record_return_visit()
        } else {
            session
        };

        // 4. Persist
        self.sessions.save(&session).await?;

        info!(
            session_id = %session.id(),
            chatbot_config_id = %config_id,
            "chat session started"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryChatbotConfigRepository, InMemorySessionRepository};
    use crate::domain::chatbot::ChatbotConfig;
    use crate::domain::foundation::SessionStatus;
    use crate::domain::session::QualificationStatus;

    async fn handler() -> (StartChatSessionHandler, Arc<InMemorySessionRepository>) {
        let sessions = Arc::new(InMemorySessionRepository::new());
        let configs = Arc::new(InMemoryChatbotConfigRepository::new());
        configs
            .insert(ChatbotConfig::new("bot-1", "org-1", "Sales Bot").unwrap())
            .await;
        configs
            .insert(
                ChatbotConfig::new("bot-off", "org-1", "Retired Bot")
                    .unwrap()
                    .deactivated(),
            )
            .await;
        (
            StartChatSessionHandler::new(sessions.clone(), configs),
            sessions,
        )
    }

    #[tokio::test]
    async fn creates_and_persists_active_session() {
        let (handler, sessions) = handler().await;

        let session = handler
            .handle(StartChatSessionCommand::new("bot-1", "org-1", "visitor-1"))
            .await
            .unwrap();

        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(
            session.lead_qualification().status(),
            QualificationStatus::NotStarted
        );
        assert_eq!(sessions.get(session.id()).await.unwrap(), session);
    }

    #[tokio::test]
    async fn returning_visitor_and_landing_page_seed_context() {
        let (handler, _) = handler().await;
        let cmd = StartChatSessionCommand {
            returning_visitor: true,
            landing_page: Some("https://example.com/pricing".into()),
            session_token: Some("tok-123".into()),
            ..StartChatSessionCommand::new("bot-1", "org-1", "visitor-1")
        };

        let session = handler.handle(cmd).await.unwrap();

        assert_eq!(session.context().previous_visits, 1);
        assert_eq!(session.context().page_views.len(), 1);
        assert_eq!(session.session_token().as_str(), "tok-123");
    }

    #[tokio::test]
    async fn unknown_config_is_not_found() {
        let (handler, _) = handler().await;
        let err = handler
            .handle(StartChatSessionCommand::new("bot-x", "org-1", "visitor-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ChatbotConfigNotFound(_)));
    }

    #[tokio::test]
    async fn inactive_or_foreign_config_is_not_found() {
        let (handler, sessions) = handler().await;

        let inactive = handler
            .handle(StartChatSessionCommand::new("bot-off", "org-1", "visitor-1"))
            .await;
        let foreign = handler
            .handle(StartChatSessionCommand::new("bot-1", "org-2", "visitor-1"))
            .await;

        assert!(matches!(inactive, Err(ChatError::ChatbotConfigNotFound(_))));
        assert!(matches!(foreign, Err(ChatError::ChatbotConfigNotFound(_))));
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn blank_visitor_is_validation_error() {
        let (handler, _) = handler().await;
        let err = handler
            .handle(StartChatSessionCommand::new("bot-1", "org-1", " "))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }
}
