//! Application layer - use cases and command handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::{
    // Chat pipeline
    ChatError, ChatMessageProcessor, ConversationMetrics, ErrorCategory,
    KnowledgeRetrievalCoordinator, MessageProcessingPipeline, PipelineSettings,
    ProcessChatMessageRequest, ProcessChatMessageResult, ProcessChatMessageUseCase,
    RequestMetadata, RetrievalContext, SessionPermit, SessionSingleFlight,
    // Qualification
    LeadQualificationCommand, LeadQualificationHandler, LeadQualificationResult,
    QualificationAction,
    // Session lifecycle
    ExpireIdleSessionsHandler, ExpireIdleSessionsResult, ExpirySettings, StartChatSessionCommand,
    StartChatSessionHandler,
};
