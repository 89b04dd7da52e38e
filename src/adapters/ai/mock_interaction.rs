//! Mock AI interaction for testing.
//!
//! Provides a configurable mock implementation of the AIInteraction port,
//! allowing tests and the demo binary to run without a language model.
//!
//! # Features
//!
//! - Pre-configured responses (consumed in order)
//! - Simulated delays for timeout testing
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let ai = MockAIInteraction::new()
//!     .with_reply("Hello, how can I help?")
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = ai.process(request).await?;
//! assert_eq!(response.response.content, "Hello, how can I help?");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIInteraction, AIInteractionRequest, AIInteractionResponse, ConversationFlow,
    GeneratedResponse, MessageAnalysis, TokenUsage,
};

/// Model name reported by the mock.
pub const MOCK_MODEL: &str = "mock-model-1";

const DEFAULT_REPLY: &str = "Thanks for reaching out! How can I help you today?";

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(Box<AIInteractionResponse>),
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    ContentFiltered { reason: String },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
    Parse { message: String },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContentFiltered { reason } => AIError::content_filtered(reason),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::timeout(timeout_secs),
            MockError::Parse { message } => AIError::parse(message),
        }
    }
}

/// Mock AI interaction. Clones share the response queue and call history.
#[derive(Debug, Clone, Default)]
pub struct MockAIInteraction {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<AIInteractionRequest>>>,
}

impl MockAIInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    /// A neutral response carrying `content`.
    pub fn reply(content: impl Into<String>) -> AIInteractionResponse {
        AIInteractionResponse {
            analysis: MessageAnalysis::default(),
            conversation_flow: ConversationFlow::default(),
            response: GeneratedResponse::new(content),
            usage: TokenUsage::new(50, 20),
            model: MOCK_MODEL.to_string(),
        }
    }

    /// Queues a neutral response with the given content.
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.with_response(Self::reply(content))
    }

    /// Queues a fully specified response.
    pub fn with_response(self, response: AIInteractionResponse) -> Self {
        lock(&self.responses).push_back(MockResponse::Success(Box::new(response)));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: MockError) -> Self {
        lock(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded requests.
    pub fn calls(&self) -> Vec<AIInteractionRequest> {
        lock(&self.calls).clone()
    }

    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success(Box::new(Self::reply(DEFAULT_REPLY))))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl AIInteraction for MockAIInteraction {
    async fn process(&self, request: AIInteractionRequest) -> Result<AIInteractionResponse, AIError> {
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Success(response) => Ok(*response),
            MockResponse::Error(err) => Err(err.into()),
        }
    }
}
