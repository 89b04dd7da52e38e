//! MessageProcessingPipeline - turns one visitor message into an updated session and a reply.
//!
//! Stages run strictly in order:
//!
//! 1. Validate the request (no I/O)
//! 2. Load the session and its chatbot config
//! 3. Build the token-aware message window and the enhanced context
//! 4. One unified AI interaction call
//! 5. Merge extracted entities
//! 6. Apply the context update
//! 7. Evaluate the lead-capture decision
//! 8. Persist both messages, then the session
//!
//! Stage 8 is the only write. The session update is its last step and
//! commits the turn, so any failure before it leaves the stored session
//! untouched.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::domain::chatbot::ChatbotConfig;
use crate::domain::conversation::{
    ChatMessage, ContextWindowSettings, ConversationPhase, IntentClassifier, IntentResult,
    MessageMetadata, MessageWindow, MessageWindowBuilder, RuleBasedIntentClassifier,
};
use crate::domain::entities::EntityAccumulator;
use crate::domain::foundation::{ChatSessionId, Timestamp, ValidationError};
use crate::domain::lead::{EngagementScorer, LeadCaptureDecisionEngine};
use crate::domain::session::{ChatSession, CriticalMoment, JourneyStage, PageView, PhaseSummary};
use crate::ports::{
    AIError, AIInteraction, AIInteractionRequest, AIInteractionResponse, ChatbotConfigRepository,
    EnhancedContext, KnowledgeSearchError, MessageRepository, SessionRepository,
};

use super::errors::ChatError;
use super::knowledge_retrieval::{KnowledgeRetrievalCoordinator, RetrievalContext};
use super::single_flight::{SessionPermit, SessionSingleFlight};

/// Optional page context sent with a visitor message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestMetadata {
    pub page_url: Option<String>,
    pub page_title: Option<String>,
    pub user_agent: Option<String>,
}

/// One inbound visitor message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessChatMessageRequest {
    pub user_message: String,
    pub session_id: String,
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub metadata: Option<RequestMetadata>,
}

impl ProcessChatMessageRequest {
    pub fn new(
        session_id: impl Into<String>,
        organization_id: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            user_message: user_message.into(),
            session_id: session_id.into(),
            organization_id: organization_id.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(self, metadata: RequestMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..self
        }
    }
}

/// Counters describing the processed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversationMetrics {
    /// Stored messages for the session, including this turn's two.
    pub message_count: usize,
    pub turn_count: u32,
    /// Tokens reported by the AI interaction.
    pub tokens_used: u32,
    pub processing_time_ms: u64,
    pub engagement_score: u8,
    /// Tokens of the history actually sent.
    pub window_tokens: u32,
    /// Older messages folded into the summary.
    pub summarized_messages: usize,
}

/// Outcome of one processed message.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessChatMessageResult {
    pub session: ChatSession,
    pub user_message: ChatMessage,
    pub bot_message: ChatMessage,
    pub enhanced_context: EnhancedContext,
    pub should_capture_lead_info: bool,
    pub suggested_next_actions: Vec<String>,
    pub conversation_metrics: ConversationMetrics,
}

/// Seam between the use case and whatever processes a message.
#[async_trait]
pub trait ChatMessageProcessor: Send + Sync {
    async fn process(
        &self,
        request: ProcessChatMessageRequest,
    ) -> Result<ProcessChatMessageResult, ChatError>;
}

/// Timeouts and defaults for one pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub ai_timeout: Duration,
    pub knowledge_timeout: Duration,
    pub repository_timeout: Duration,
    /// Budget defaults under any per-chatbot overrides.
    pub context_window: ContextWindowSettings,
    pub single_flight: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            ai_timeout: Duration::from_secs(30),
            knowledge_timeout: Duration::from_secs(5),
            repository_timeout: Duration::from_secs(5),
            context_window: ContextWindowSettings::default(),
            single_flight: true,
        }
    }
}

/// A validated request.
struct ValidatedRequest {
    session_id: ChatSessionId,
    organization_id: String,
    user_message: ChatMessage,
    metadata: Option<RequestMetadata>,
}

/// What stage 3 hands to the AI call.
struct PreparedContext {
    history_len: usize,
    window: MessageWindow,
    intent: IntentResult,
    enhanced: EnhancedContext,
    max_response_tokens: u32,
}

/// Orchestrates one visitor turn across the ports.
pub struct MessageProcessingPipeline {
    sessions: Arc<dyn SessionRepository>,
    messages: Arc<dyn MessageRepository>,
    configs: Arc<dyn ChatbotConfigRepository>,
    ai: Arc<dyn AIInteraction>,
    knowledge: KnowledgeRetrievalCoordinator,
    classifier: Arc<dyn IntentClassifier>,
    accumulator: EntityAccumulator,
    lead_engine: LeadCaptureDecisionEngine,
    scorer: EngagementScorer,
    single_flight: Option<SessionSingleFlight>,
    settings: PipelineSettings,
}

impl MessageProcessingPipeline {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        messages: Arc<dyn MessageRepository>,
        configs: Arc<dyn ChatbotConfigRepository>,
        ai: Arc<dyn AIInteraction>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            sessions,
            messages,
            configs,
            ai,
            knowledge: KnowledgeRetrievalCoordinator::unconfigured(),
            classifier: Arc::new(RuleBasedIntentClassifier),
            accumulator: EntityAccumulator::new(),
            lead_engine: LeadCaptureDecisionEngine::new(),
            scorer: EngagementScorer,
            single_flight: settings.single_flight.then(SessionSingleFlight::new),
            settings,
        }
    }

    pub fn with_knowledge(self, knowledge: KnowledgeRetrievalCoordinator) -> Self {
        Self { knowledge, ..self }
    }

    pub fn with_classifier(self, classifier: Arc<dyn IntentClassifier>) -> Self {
        Self { classifier, ..self }
    }

    pub fn with_entity_accumulator(self, accumulator: EntityAccumulator) -> Self {
        Self {
            accumulator,
            ..self
        }
    }

    /// Shares a guard with other pipeline instances.
    pub fn with_single_flight(self, single_flight: SessionSingleFlight) -> Self {
        Self {
            single_flight: Some(single_flight),
            ..self
        }
    }

    #[tracing::instrument(skip_all, fields(session_id = %request.session_id))]
    pub async fn handle(
        &self,
        request: ProcessChatMessageRequest,
    ) -> Result<ProcessChatMessageResult, ChatError> {
        let started = Instant::now();

        // 1. Validate
        let request = validate(request)?;
        let _permit = self.acquire(request.session_id)?;

        // 2. Load
        let (session, config) = self.load(&request).await?;
        let session = session.record_activity();
        debug!(status = %session.status(), "session loaded");

        // 3. Window + enhanced context
        let prepared = self.prepare_context(&request, &session, &config).await?;
        debug!(
            window_tokens = prepared.window.window_tokens,
            summarized = prepared.window.summarized.len(),
            knowledge = prepared.enhanced.knowledge.is_some(),
            "context prepared"
        );

        // 4. Unified AI interaction
        let response = self
            .interact(&request, &session, &config, &prepared)
            .await?;
        debug!(model = %response.model, tokens = response.usage.total_tokens, "ai interaction complete");

        // 5. Entities
        let turn = session.context().turn_count.saturating_add(1);
        let entities = self.accumulator.merge(
            &session.context().accumulated_entities,
            &response.analysis.entities,
            turn,
        );

        // 6. Context update
        let session = self.apply_context_update(
            session.with_accumulated_entities(entities),
            &request,
            &prepared,
            &response,
            turn,
        );

        // 7. Lead decision
        let decision = self.lead_engine.evaluate(&session, &config);
        debug!(
            should_capture = decision.should_capture_lead_info,
            actions = decision.suggested_actions.len(),
            "lead decision evaluated"
        );

        // 8. Persist
        let elapsed_ms = elapsed_millis(started);
        let user_message = request.user_message.with_metadata(MessageMetadata {
            intent: Some(response.analysis.intent),
            confidence: Some(response.analysis.confidence),
            sentiment: Some(response.analysis.sentiment),
            ..Default::default()
        });
        let bot_message = ChatMessage::assistant(*session.id(), response.response.content.clone())?
            .with_metadata(MessageMetadata {
                processing_time_ms: Some(elapsed_ms),
                model: Some(response.model.clone()),
                ..Default::default()
            });

        self.persist(&session, &user_message, &bot_message).await?;

        let conversation_metrics = ConversationMetrics {
            message_count: prepared.history_len + 2,
            turn_count: session.context().turn_count,
            tokens_used: response.usage.total_tokens,
            processing_time_ms: elapsed_millis(started),
            engagement_score: session.engagement_score().value(),
            window_tokens: prepared.window.window_tokens,
            summarized_messages: prepared.window.summarized.len(),
        };

        info!(
            turn = conversation_metrics.turn_count,
            engagement = conversation_metrics.engagement_score,
            should_capture = decision.should_capture_lead_info,
            elapsed_ms = conversation_metrics.processing_time_ms,
            "chat message processed"
        );

        Ok(ProcessChatMessageResult {
            session,
            user_message,
            bot_message,
            enhanced_context: prepared.enhanced,
            should_capture_lead_info: decision.should_capture_lead_info,
            suggested_next_actions: decision.suggested_actions,
            conversation_metrics,
        })
    }

    fn acquire(&self, session_id: ChatSessionId) -> Result<Option<SessionPermit>, ChatError> {
        match &self.single_flight {
            None => Ok(None),
            Some(flight) => flight
                .try_acquire(session_id)
                .map(Some)
                .ok_or(ChatError::ConcurrentRequest(session_id)),
        }
    }

    async fn load(
        &self,
        request: &ValidatedRequest,
    ) -> Result<(ChatSession, ChatbotConfig), ChatError> {
        let repo_timeout = self.settings.repository_timeout;

        let session = bounded(
            repo_timeout,
            self.sessions.find_by_id(&request.session_id),
            repository_timeout,
        )
        .await?
        .ok_or(ChatError::SessionNotFound(request.session_id))?;

        if session.is_terminal() {
            return Err(ChatError::SessionClosed(request.session_id));
        }

        let config_id = session.chatbot_config_id();
        let config = bounded(repo_timeout, self.configs.find_by_id(config_id), repository_timeout)
            .await?
            .filter(|c| c.organization_id().as_str() == request.organization_id)
            .filter(ChatbotConfig::is_active)
            .ok_or_else(|| ChatError::ChatbotConfigNotFound(config_id.to_string()))?;

        Ok((session, config))
    }

    async fn prepare_context(
        &self,
        request: &ValidatedRequest,
        session: &ChatSession,
        config: &ChatbotConfig,
    ) -> Result<PreparedContext, ChatError> {
        let budget = config.context_window(&self.settings.context_window)?;

        let history = bounded(
            self.settings.repository_timeout,
            self.messages.find_by_session_id(&request.session_id),
            repository_timeout,
        )
        .await?;
        let window = MessageWindowBuilder::new(budget).build(&history);

        let query = request.user_message.content();
        let intent = self.classifier.classify(query);
        let topic_count = session.context().topics.len();
        let knowledge_intensive =
            KnowledgeRetrievalCoordinator::is_knowledge_intensive(&intent, topic_count);

        let knowledge = if config.knowledge_base_enabled() && self.knowledge.is_configured() {
            let search = async {
                if knowledge_intensive {
                    let context = session.context();
                    let preferences = context
                        .topics
                        .iter()
                        .chain(context.interests.iter())
                        .cloned()
                        .collect();
                    self.knowledge
                        .retrieve_knowledge_with_enhanced_context(
                            query,
                            window.recent.iter().map(|m| m.content().to_string()).collect(),
                            preferences,
                            Some(intent.clone()),
                        )
                        .await
                } else {
                    let context = RetrievalContext {
                        intent: Some(intent.clone()),
                        ..Default::default()
                    };
                    self.knowledge.retrieve_knowledge(query, Some(context)).await
                }
            };
            bounded(self.settings.knowledge_timeout, search, |secs| {
                KnowledgeSearchError::Timeout { timeout_secs: secs }.into()
            })
            .await?
        } else {
            None
        };

        Ok(PreparedContext {
            history_len: history.len(),
            enhanced: EnhancedContext {
                intent: Some(intent.clone()),
                knowledge,
                knowledge_intensive,
            },
            intent,
            window,
            max_response_tokens: budget.response_reserved_tokens(),
        })
    }

    async fn interact(
        &self,
        request: &ValidatedRequest,
        session: &ChatSession,
        config: &ChatbotConfig,
        prepared: &PreparedContext,
    ) -> Result<AIInteractionResponse, ChatError> {
        let ai_request = AIInteractionRequest {
            user_message: request.user_message.content().to_string(),
            message_history: prepared.window.recent.clone(),
            conversation_summary: prepared.window.summary_text(),
            session: session.clone(),
            chatbot_config: config.clone(),
            enhanced_context: prepared.enhanced.clone(),
            max_response_tokens: prepared.max_response_tokens,
        };

        let response = bounded(self.settings.ai_timeout, self.ai.process(ai_request), |secs| {
            AIError::timeout(secs).into()
        })
        .await?;

        if response.response.content.trim().is_empty() {
            return Err(AIError::parse("response content is empty").into());
        }
        Ok(response)
    }

    fn apply_context_update(
        &self,
        session: ChatSession,
        request: &ValidatedRequest,
        prepared: &PreparedContext,
        response: &AIInteractionResponse,
        turn: u32,
    ) -> ChatSession {
        let analysis = &response.analysis;
        let flow = &response.conversation_flow;
        let previous_phase = session.context().conversation_phase;

        let engagement = self.scorer.next_score(
            session.engagement_score(),
            flow.engagement_level,
            analysis.sentiment,
            flow.flags.buying_signal,
        );
        let mut session = session
            .advance_turn()
            .update_engagement_score(i64::from(engagement.value()));

        for topic in analysis.topics.iter().chain(prepared.intent.topics.iter()) {
            session = session.add_topic(topic);
        }
        for interest in &analysis.interests {
            session = session.add_interest(interest);
        }

        session = session
            .update_conversation_phase(flow.phase)
            .update_journey_stage(JourneyStage::from_phase(flow.phase));

        if flow.phase != previous_phase {
            session = session.add_phase_summary(phase_summary(previous_phase, flow.phase, turn));
        }
        if let Some(summary) = prepared.window.summary_text() {
            session = session.update_conversation_summary(summary);
        }
        if flow.flags.buying_signal {
            session = session.add_critical_moment(CriticalMoment {
                turn,
                description: "Buying signal detected".to_string(),
                importance: 0.8,
            });
        }
        if flow.flags.escalation_needed {
            session = session.add_critical_moment(CriticalMoment {
                turn,
                description: "Escalation requested".to_string(),
                importance: 1.0,
            });
        }
        if let Some(url) = request.metadata.as_ref().and_then(|m| m.page_url.as_deref()) {
            session = session.add_page_view(PageView {
                title: request.metadata.as_ref().and_then(|m| m.page_title.clone()),
                ..PageView::new(url)
            });
        }

        session
    }

    async fn persist(
        &self,
        session: &ChatSession,
        user_message: &ChatMessage,
        bot_message: &ChatMessage,
    ) -> Result<(), ChatError> {
        let limit = self.settings.repository_timeout;
        bounded(limit, self.messages.save(user_message), repository_timeout).await?;
        bounded(limit, self.messages.save(bot_message), repository_timeout).await?;
        // The session update commits the turn, so it goes last.
        bounded(limit, self.sessions.update(session), repository_timeout).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatMessageProcessor for MessageProcessingPipeline {
    async fn process(
        &self,
        request: ProcessChatMessageRequest,
    ) -> Result<ProcessChatMessageResult, ChatError> {
        self.handle(request).await
    }
}

fn validate(request: ProcessChatMessageRequest) -> Result<ValidatedRequest, ChatError> {
    let organization_id = request.organization_id.trim();
    if organization_id.is_empty() {
        return Err(ValidationError::empty_field("organization_id").into());
    }
    let session_id = request.session_id.trim();
    if session_id.is_empty() {
        return Err(ValidationError::empty_field("session_id").into());
    }
    let session_id: ChatSessionId = session_id
        .parse()
        .map_err(|_| ValidationError::invalid_format("session_id", "expected a UUID"))?;
    let user_message = ChatMessage::user(session_id, request.user_message)
        .map_err(|_| ValidationError::empty_field("user_message"))?;

    Ok(ValidatedRequest {
        session_id,
        organization_id: organization_id.to_string(),
        user_message,
        metadata: request.metadata,
    })
}

fn phase_summary(from: ConversationPhase, to: ConversationPhase, turn: u32) -> PhaseSummary {
    PhaseSummary {
        phase: from,
        summary: format!("Moved from {} to {} at turn {}", from, to, turn),
        recorded_at: Timestamp::now(),
    }
}

fn repository_timeout(timeout_secs: u32) -> ChatError {
    ChatError::RepositoryTimeout { timeout_secs }
}

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Runs `fut` under `limit`, mapping its error into `ChatError`.
async fn bounded<T, E, F>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce(u32) -> ChatError,
) -> Result<T, ChatError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ChatError>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(on_timeout(
            u32::try_from(limit.as_secs()).unwrap_or(u32::MAX),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        InMemoryChatbotConfigRepository, InMemoryKnowledgeSearch, InMemoryMessageRepository,
        InMemorySessionRepository, MockAIInteraction, MockError,
    };
    use crate::domain::chatbot::ChatbotConfig;
    use crate::domain::conversation::{EngagementLevel, IntentType, Sentiment};
    use crate::domain::entities::ExtractedEntity;
    use crate::domain::foundation::SessionStatus;
    use crate::ports::{ConversationFlow, FlowFlags, GeneratedResponse, MessageAnalysis, TokenUsage};

    struct Fixture {
        sessions: Arc<InMemorySessionRepository>,
        messages: Arc<InMemoryMessageRepository>,
        configs: Arc<InMemoryChatbotConfigRepository>,
        session: ChatSession,
    }

    impl Fixture {
        async fn new(config: ChatbotConfig) -> Self {
            let sessions = Arc::new(InMemorySessionRepository::new());
            let messages = Arc::new(InMemoryMessageRepository::new());
            let configs = Arc::new(InMemoryChatbotConfigRepository::new());

            let session = ChatSession::create("bot-1", "visitor-1", None).unwrap();
            sessions.insert(session.clone()).await;
            configs.insert(config).await;

            Self {
                sessions,
                messages,
                configs,
                session,
            }
        }

        async fn standard() -> Self {
            Self::new(ChatbotConfig::new("bot-1", "org-1", "Sales Bot").unwrap()).await
        }

        fn pipeline(&self, ai: MockAIInteraction) -> MessageProcessingPipeline {
            MessageProcessingPipeline::new(
                self.sessions.clone(),
                self.messages.clone(),
                self.configs.clone(),
                Arc::new(ai),
                PipelineSettings::default(),
            )
        }

        fn request(&self, message: &str) -> ProcessChatMessageRequest {
            ProcessChatMessageRequest::new(self.session.id().to_string(), "org-1", message)
        }
    }

    fn response(content: &str) -> AIInteractionResponse {
        AIInteractionResponse {
            analysis: MessageAnalysis::default(),
            conversation_flow: ConversationFlow::default(),
            response: GeneratedResponse::new(content),
            usage: TokenUsage::new(120, 40),
            model: "mock-model-1".to_string(),
        }
    }

    mod happy_path {
        use super::*;

        #[tokio::test]
        async fn processes_message_and_persists_turn() {
            let fx = Fixture::standard().await;
            let ai = MockAIInteraction::new().with_response(response("Happy to help!"));
            let pipeline = fx.pipeline(ai);

            let result = pipeline.handle(fx.request("Hi there")).await.unwrap();

            assert_eq!(result.bot_message.content(), "Happy to help!");
            assert_eq!(result.user_message.content(), "Hi there");
            assert_eq!(result.session.context().turn_count, 1);
            assert_eq!(result.conversation_metrics.message_count, 2);
            assert_eq!(result.conversation_metrics.tokens_used, 160);

            let stored = fx.sessions.get(fx.session.id()).await.unwrap();
            assert_eq!(stored.context().turn_count, 1);
            assert_eq!(fx.messages.messages_for(fx.session.id()).await.len(), 2);
        }

        #[tokio::test]
        async fn applies_analysis_to_context() {
            let fx = Fixture::standard().await;
            let ai = MockAIInteraction::new().with_response(AIInteractionResponse {
                analysis: MessageAnalysis {
                    intent: IntentType::PricingInquiry,
                    confidence: 0.9,
                    entities: vec![ExtractedEntity::new("budget", "$50k", 0.8)],
                    sentiment: Sentiment::Positive,
                    topics: vec!["Pricing".into()],
                    interests: vec!["analytics".into()],
                    ..Default::default()
                },
                conversation_flow: ConversationFlow {
                    phase: ConversationPhase::Qualification,
                    engagement_level: EngagementLevel::High,
                    flags: FlowFlags {
                        buying_signal: true,
                        ..Default::default()
                    },
                },
                ..response("Our plans start at $99.")
            });
            let pipeline = fx.pipeline(ai);

            let result = pipeline.handle(fx.request("How much is it?")).await.unwrap();
            let context = result.session.context();

            // 0 + 10 (high) + 5 (positive) + 5 (buying signal)
            assert_eq!(context.engagement_score.value(), 20);
            assert!(context.has_topic("pricing"));
            assert_eq!(context.interests, vec!["analytics"]);
            assert_eq!(context.conversation_phase, ConversationPhase::Qualification);
            assert_eq!(context.journey_stage, JourneyStage::Consideration);
            assert_eq!(context.conversation_summary.phase_summaries.len(), 1);
            assert_eq!(context.conversation_summary.critical_moments.len(), 1);

            let budget = &context.accumulated_entities["budget"];
            assert_eq!(budget.value, "$50k");
            assert_eq!(budget.source_turns, vec![1]);

            assert_eq!(
                result.user_message.metadata().intent,
                Some(IntentType::PricingInquiry)
            );
        }

        #[tokio::test]
        async fn reactivates_idle_session() {
            let fx = Fixture::standard().await;
            fx.sessions.insert(fx.session.clone().mark_idle()).await;
            let pipeline = fx.pipeline(MockAIInteraction::new());

            let result = pipeline.handle(fx.request("Back again")).await.unwrap();
            assert_eq!(result.session.status(), SessionStatus::Active);
        }

        #[tokio::test]
        async fn records_page_view_from_metadata() {
            let fx = Fixture::standard().await;
            let pipeline = fx.pipeline(MockAIInteraction::new());
            let request = fx.request("Hello").with_metadata(RequestMetadata {
                page_url: Some("https://example.com/pricing".into()),
                page_title: Some("Pricing".into()),
                ..Default::default()
            });

            let result = pipeline.handle(request).await.unwrap();
            let views = &result.session.context().page_views;
            assert_eq!(views.len(), 1);
            assert_eq!(views[0].url, "https://example.com/pricing");
        }
    }

    mod validation {
        use super::*;

        #[tokio::test]
        async fn blank_message_rejected_before_io() {
            let fx = Fixture::standard().await;
            let ai = MockAIInteraction::new();
            let pipeline = fx.pipeline(ai.clone());

            let err = pipeline.handle(fx.request("   ")).await.unwrap_err();

            assert!(matches!(err, ChatError::Validation(_)));
            assert_eq!(fx.sessions.call_count(), 0);
            assert_eq!(ai.call_count(), 0);
        }

        #[tokio::test]
        async fn malformed_session_id_rejected() {
            let fx = Fixture::standard().await;
            let pipeline = fx.pipeline(MockAIInteraction::new());
            let request = ProcessChatMessageRequest::new("not-a-uuid", "org-1", "Hi");

            let err = pipeline.handle(request).await.unwrap_err();
            assert!(matches!(
                err,
                ChatError::Validation(ValidationError::InvalidFormat { .. })
            ));
        }
    }

    mod loading {
        use super::*;

        #[tokio::test]
        async fn unknown_session_is_not_found() {
            let fx = Fixture::standard().await;
            let pipeline = fx.pipeline(MockAIInteraction::new());
            let request =
                ProcessChatMessageRequest::new(ChatSessionId::new().to_string(), "org-1", "Hi");

            let err = pipeline.handle(request).await.unwrap_err();
            assert!(matches!(err, ChatError::SessionNotFound(_)));
        }

        #[tokio::test]
        async fn terminal_session_is_closed() {
            let fx = Fixture::standard().await;
            fx.sessions.insert(fx.session.clone().end()).await;
            let ai = MockAIInteraction::new();
            let pipeline = fx.pipeline(ai.clone());

            let err = pipeline.handle(fx.request("Hi")).await.unwrap_err();
            assert!(matches!(err, ChatError::SessionClosed(_)));
            assert_eq!(ai.call_count(), 0);
        }

        #[tokio::test]
        async fn config_of_other_organization_is_not_found() {
            let fx = Fixture::standard().await;
            let pipeline = fx.pipeline(MockAIInteraction::new());
            let request = ProcessChatMessageRequest::new(fx.session.id().to_string(), "org-2", "Hi");

            let err = pipeline.handle(request).await.unwrap_err();
            assert!(matches!(err, ChatError::ChatbotConfigNotFound(_)));
        }

        #[tokio::test]
        async fn invalid_budget_is_configuration_error() {
            let config = ChatbotConfig::new("bot-1", "org-1", "Sales Bot")
                .unwrap()
                .with_context_window(ContextWindowSettings {
                    max_tokens: Some(100),
                    ..Default::default()
                });
            let fx = Fixture::new(config).await;
            let pipeline = fx.pipeline(MockAIInteraction::new());

            let err = pipeline.handle(fx.request("Hi")).await.unwrap_err();
            assert!(matches!(err, ChatError::Configuration(_)));
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn ai_error_leaves_state_untouched() {
            let fx = Fixture::standard().await;
            let ai = MockAIInteraction::new().with_error(MockError::Unavailable {
                message: "overloaded".into(),
            });
            let pipeline = fx.pipeline(ai);

            let err = pipeline.handle(fx.request("Hi")).await.unwrap_err();

            assert!(matches!(err, ChatError::AIInteraction(AIError::Unavailable { .. })));
            assert_eq!(fx.sessions.get(fx.session.id()).await.unwrap(), fx.session);
            assert!(fx.messages.messages_for(fx.session.id()).await.is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn ai_timeout_is_classified() {
            let fx = Fixture::standard().await;
            let ai = MockAIInteraction::new().with_delay(Duration::from_secs(60));
            let pipeline = fx.pipeline(ai);

            let err = pipeline.handle(fx.request("Hi")).await.unwrap_err();

            assert!(matches!(
                err,
                ChatError::AIInteraction(AIError::Timeout { timeout_secs: 30 })
            ));
            assert_eq!(fx.sessions.get(fx.session.id()).await.unwrap(), fx.session);
        }

        #[tokio::test]
        async fn empty_ai_content_is_parse_error() {
            let fx = Fixture::standard().await;
            let ai = MockAIInteraction::new().with_response(response("  "));
            let pipeline = fx.pipeline(ai);

            let err = pipeline.handle(fx.request("Hi")).await.unwrap_err();
            assert!(matches!(err, ChatError::AIInteraction(AIError::Parse(_))));
        }

        #[tokio::test]
        async fn update_failure_propagates() {
            let fx = Fixture::standard().await;
            fx.sessions.fail_updates(true);
            let pipeline = fx.pipeline(MockAIInteraction::new());

            let err = pipeline.handle(fx.request("Hi")).await.unwrap_err();
            assert!(matches!(err, ChatError::Repository(_)));
            assert_eq!(fx.sessions.get(fx.session.id()).await.unwrap(), fx.session);
        }

        #[tokio::test]
        async fn message_save_failure_skips_session_update() {
            let fx = Fixture::standard().await;
            fx.messages.fail_saves(true);
            let pipeline = fx.pipeline(MockAIInteraction::new());

            let err = pipeline.handle(fx.request("Hi")).await.unwrap_err();

            assert!(matches!(err, ChatError::Repository(_)));
            assert_eq!(fx.sessions.get(fx.session.id()).await.unwrap(), fx.session);
            assert_eq!(fx.sessions.update_count(), 0);
        }
    }

    mod knowledge {
        use super::*;

        #[tokio::test]
        async fn no_capability_means_no_knowledge() {
            let config = ChatbotConfig::new("bot-1", "org-1", "Sales Bot")
                .unwrap()
                .with_knowledge_base(true);
            let fx = Fixture::new(config).await;
            let pipeline = fx.pipeline(MockAIInteraction::new());

            let result = pipeline.handle(fx.request("What is SSO?")).await.unwrap();
            assert!(result.enhanced_context.knowledge.is_none());
            assert!(result.enhanced_context.knowledge_intensive);
        }

        #[tokio::test]
        async fn configured_capability_yields_result() {
            let config = ChatbotConfig::new("bot-1", "org-1", "Sales Bot")
                .unwrap()
                .with_knowledge_base(true);
            let fx = Fixture::new(config).await;
            let search = InMemoryKnowledgeSearch::new().with_article(
                "kb-1",
                "Single sign-on",
                "We support SSO through SAML and OIDC.",
            );
            let pipeline = fx
                .pipeline(MockAIInteraction::new())
                .with_knowledge(KnowledgeRetrievalCoordinator::new(Arc::new(search)));

            let result = pipeline.handle(fx.request("Do you support SSO?")).await.unwrap();
            let knowledge = result.enhanced_context.knowledge.unwrap();
            assert_eq!(knowledge.items[0].id, "kb-1");
        }

        #[tokio::test]
        async fn knowledge_disabled_in_config_skips_search() {
            let fx = Fixture::standard().await;
            let search = Arc::new(InMemoryKnowledgeSearch::new());
            let pipeline = fx
                .pipeline(MockAIInteraction::new())
                .with_knowledge(KnowledgeRetrievalCoordinator::new(search.clone()));

            let result = pipeline.handle(fx.request("What is SSO?")).await.unwrap();
            assert!(result.enhanced_context.knowledge.is_none());
            assert_eq!(search.call_count(), 0);
        }

        #[tokio::test]
        async fn search_failure_aborts_turn() {
            let config = ChatbotConfig::new("bot-1", "org-1", "Sales Bot")
                .unwrap()
                .with_knowledge_base(true);
            let fx = Fixture::new(config).await;
            let ai = MockAIInteraction::new();
            let pipeline = fx
                .pipeline(ai.clone())
                .with_knowledge(KnowledgeRetrievalCoordinator::new(Arc::new(
                    InMemoryKnowledgeSearch::failing(),
                )));

            let err = pipeline.handle(fx.request("What is SSO?")).await.unwrap_err();
            assert!(matches!(err, ChatError::KnowledgeSearch(_)));
            assert_eq!(ai.call_count(), 0);
        }
    }

    mod single_flight {
        use super::*;

        #[tokio::test]
        async fn held_session_rejects_second_run() {
            let fx = Fixture::standard().await;
            let flight = SessionSingleFlight::new();
            let pipeline = fx
                .pipeline(MockAIInteraction::new())
                .with_single_flight(flight.clone());

            let _held = flight.try_acquire(*fx.session.id()).unwrap();
            let err = pipeline.handle(fx.request("Hi")).await.unwrap_err();

            assert!(matches!(err, ChatError::ConcurrentRequest(_)));
            assert_eq!(fx.sessions.call_count(), 0);
        }

        #[tokio::test]
        async fn permit_released_after_run() {
            let fx = Fixture::standard().await;
            let flight = SessionSingleFlight::new();
            let pipeline = fx
                .pipeline(MockAIInteraction::new())
                .with_single_flight(flight.clone());

            pipeline.handle(fx.request("Hi")).await.unwrap();
            assert!(!flight.is_in_flight(fx.session.id()));
            pipeline.handle(fx.request("Again")).await.unwrap();
        }
    }
}
