//! AI interaction adapters.

mod mock_interaction;

pub use mock_interaction::{MockAIInteraction, MockError, MockResponse, MOCK_MODEL};
