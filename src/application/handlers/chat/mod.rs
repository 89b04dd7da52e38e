//! Chat handlers - processing one visitor message end to end.

mod errors;
mod knowledge_retrieval;
mod message_pipeline;
mod process_chat_message;
mod single_flight;

pub use errors::{ChatError, ErrorCategory};
pub use knowledge_retrieval::{
    KnowledgeRetrievalCoordinator, RetrievalContext, ENHANCED_MAX_RESULTS, ENHANCED_MIN_RELEVANCE,
    KNOWLEDGE_INTENSIVE_TOPICS, STANDARD_MAX_RESULTS, STANDARD_MIN_RELEVANCE,
};
pub use message_pipeline::{
    ChatMessageProcessor, ConversationMetrics, MessageProcessingPipeline, PipelineSettings,
    ProcessChatMessageRequest, ProcessChatMessageResult, RequestMetadata,
};
pub use process_chat_message::ProcessChatMessageUseCase;
pub use single_flight::{SessionPermit, SessionSingleFlight};
