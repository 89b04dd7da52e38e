//! Application handlers.
//!
//! Command handlers that orchestrate domain operations across ports.

pub mod chat;
pub mod qualification;
pub mod session;

pub use chat::{
    ChatError, ChatMessageProcessor, ConversationMetrics, ErrorCategory,
    KnowledgeRetrievalCoordinator, MessageProcessingPipeline, PipelineSettings,
    ProcessChatMessageRequest, ProcessChatMessageResult, ProcessChatMessageUseCase,
    RequestMetadata, RetrievalContext, SessionPermit, SessionSingleFlight,
};
pub use qualification::{
    LeadQualificationCommand, LeadQualificationHandler, LeadQualificationResult,
    QualificationAction,
};
pub use session::{
    ExpireIdleSessionsHandler, ExpireIdleSessionsResult, ExpirySettings, StartChatSessionCommand,
    StartChatSessionHandler,
};
