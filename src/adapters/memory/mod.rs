//! In-memory adapters for repositories and knowledge search.
//!
//! Used by tests and the demo binary. Nothing is persisted across restarts.

mod chatbot_config_repository;
mod knowledge_search;
mod message_repository;
mod session_repository;

pub use chatbot_config_repository::InMemoryChatbotConfigRepository;
pub use knowledge_search::InMemoryKnowledgeSearch;
pub use message_repository::InMemoryMessageRepository;
pub use session_repository::InMemorySessionRepository;
