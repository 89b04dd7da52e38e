//! Adapters - Implementations of port interfaces.
//!
//! All adapters run in-process:
//! - `ai` - Mock AI interaction with queued responses and error injection
//! - `memory` - Repositories and knowledge search backed by in-memory maps
//! - `error_tracking` - Tracing-backed and recording error trackers

pub mod ai;
pub mod error_tracking;
pub mod memory;

pub use ai::{MockAIInteraction, MockError, MockResponse, MOCK_MODEL};
pub use error_tracking::{InMemoryErrorTracker, TracingErrorTracker};
pub use memory::{
    InMemoryChatbotConfigRepository, InMemoryKnowledgeSearch, InMemoryMessageRepository,
    InMemorySessionRepository,
};
