//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Capability Ports
//!
//! - `AIInteraction` - Unified analysis + response language-model call
//! - `KnowledgeSearch` - Relevance search over the knowledge base
//! - `ErrorTracking` - Best-effort failure reporting
//!
//! ## Repository Ports
//!
//! - `SessionRepository` - Chat session persistence
//! - `MessageRepository` - Chat message persistence
//! - `ChatbotConfigRepository` - Chatbot configuration lookup

mod ai_interaction;
mod chatbot_config_repository;
mod error_tracking;
mod knowledge_search;
mod message_repository;
mod session_repository;

pub use ai_interaction::{
    AIError, AIInteraction, AIInteractionRequest, AIInteractionResponse, ConversationFlow,
    EnhancedContext, FlowFlags, GeneratedResponse, MessageAnalysis, TokenUsage,
};
pub use chatbot_config_repository::ChatbotConfigRepository;
pub use error_tracking::{ErrorContext, ErrorTracking, ErrorTrackingError};
pub use knowledge_search::{
    KnowledgeItem, KnowledgeQuery, KnowledgeSearch, KnowledgeSearchError, KnowledgeSearchResult,
};
pub use message_repository::MessageRepository;
pub use session_repository::SessionRepository;
