//! Demo composition root.
//!
//! Loads configuration, installs logging, wires the in-memory adapters and
//! processes a short scripted conversation.

use std::process::ExitCode;
use std::sync::Arc;

use leadchat::adapters::{
    InMemoryChatbotConfigRepository, InMemoryKnowledgeSearch, InMemoryMessageRepository,
    InMemorySessionRepository, MockAIInteraction, TracingErrorTracker,
};
use leadchat::application::{
    ChatError, KnowledgeRetrievalCoordinator, MessageProcessingPipeline, ProcessChatMessageRequest,
    ProcessChatMessageUseCase, StartChatSessionCommand, StartChatSessionHandler,
};
use leadchat::config::AppConfig;
use leadchat::domain::chatbot::{ChatbotConfig, LeadCaptureConfig, QualificationQuestion};
use leadchat::domain::conversation::{ConversationPhase, EngagementLevel};
use leadchat::ports::{AIInteractionResponse, ConversationFlow, FlowFlags, MessageAnalysis};

const ORGANIZATION: &str = "org-demo";
const CHATBOT: &str = "bot-demo";

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = config.validate() {
        eprintln!("invalid configuration: {}", err);
        return ExitCode::FAILURE;
    }
    if let Err(err) = config.logging.init_tracing() {
        eprintln!("failed to initialise logging: {}", err);
    }

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "demo conversation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &AppConfig) -> Result<(), ChatError> {
    let sessions = Arc::new(InMemorySessionRepository::new());
    let messages = Arc::new(InMemoryMessageRepository::new());
    let configs = Arc::new(InMemoryChatbotConfigRepository::new());
    configs.insert(demo_chatbot()?).await;

    let knowledge = InMemoryKnowledgeSearch::new()
        .with_article(
            "kb-pricing",
            "Pricing plans",
            "Starter is $99 per month, Growth is $499 per month with SSO.",
        )
        .with_article(
            "kb-trial",
            "Free trial",
            "Every plan includes a 14 day free trial without a credit card.",
        );

    let ai = MockAIInteraction::new()
        .with_reply("Hi! I can help with plans, trials and demos.")
        .with_response(AIInteractionResponse {
            analysis: MessageAnalysis {
                topics: vec!["pricing".into()],
                ..Default::default()
            },
            conversation_flow: ConversationFlow {
                phase: ConversationPhase::Presentation,
                engagement_level: EngagementLevel::High,
                flags: FlowFlags {
                    buying_signal: true,
                    ..Default::default()
                },
            },
            ..MockAIInteraction::reply("Starter is $99 per month and Growth is $499.")
        });

    let pipeline = MessageProcessingPipeline::new(
        sessions.clone(),
        messages,
        configs.clone(),
        Arc::new(ai),
        config.pipeline_settings(),
    )
    .with_knowledge(KnowledgeRetrievalCoordinator::new(Arc::new(knowledge)));
    let use_case = ProcessChatMessageUseCase::new(Arc::new(pipeline), Arc::new(TracingErrorTracker));

    let session = StartChatSessionHandler::new(sessions, configs)
        .handle(StartChatSessionCommand::new(CHATBOT, ORGANIZATION, "visitor-demo"))
        .await?;

    for text in ["Hello there", "How much does the Growth plan cost?"] {
        let request = ProcessChatMessageRequest::new(session.id().to_string(), ORGANIZATION, text);
        let result = use_case.execute(request).await?;
        println!("visitor: {}", text);
        println!("bot:     {}", result.bot_message.content());
        println!(
            "         engagement={} capture={} next={:?}",
            result.conversation_metrics.engagement_score,
            result.should_capture_lead_info,
            result.suggested_next_actions
        );
    }
    Ok(())
}

fn demo_chatbot() -> Result<ChatbotConfig, ChatError> {
    Ok(ChatbotConfig::new(CHATBOT, ORGANIZATION, "Demo Sales Bot")?
        .with_personality("friendly and concise")
        .with_knowledge_base(true)
        .with_lead_capture(LeadCaptureConfig {
            enabled: true,
            qualification_questions: vec![
                QualificationQuestion::new("budget", "What budget do you have in mind?", 2.0),
                QualificationQuestion::new("timeline", "When are you looking to start?", 1.0),
            ],
        }))
}
