//! ProcessChatMessageUseCase - entry point for one visitor message.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, warn};

use crate::domain::foundation::ValidationError;
use crate::ports::{ErrorContext, ErrorTracking};

use super::errors::ChatError;
use super::message_pipeline::{
    ChatMessageProcessor, ProcessChatMessageRequest, ProcessChatMessageResult,
};

/// Characters of the visitor message kept in tracked errors.
const TRACKED_MESSAGE_CHARS: usize = 100;

/// Validates the request, runs the processor and reports failures.
pub struct ProcessChatMessageUseCase {
    processor: Arc<dyn ChatMessageProcessor>,
    error_tracking: Arc<dyn ErrorTracking>,
}

impl ProcessChatMessageUseCase {
    pub fn new(
        processor: Arc<dyn ChatMessageProcessor>,
        error_tracking: Arc<dyn ErrorTracking>,
    ) -> Self {
        Self {
            processor,
            error_tracking,
        }
    }

    /// Processes the message. On failure the original error is returned after tracking.
    ///
    /// # Errors
    ///
    /// - `Validation` if `organization_id` is blank; nothing else is called
    /// - whatever the processor reports, unmodified
    #[tracing::instrument(skip_all, fields(session_id = %request.session_id))]
    pub async fn execute(
        &self,
        request: ProcessChatMessageRequest,
    ) -> Result<ProcessChatMessageResult, ChatError> {
        if request.organization_id.trim().is_empty() {
            return Err(ValidationError::empty_field("organization_id").into());
        }

        let started = Instant::now();
        let session_id = request.session_id.clone();
        let organization_id = request.organization_id.clone();
        let user_message = truncate_chars(&request.user_message, TRACKED_MESSAGE_CHARS);

        match self.processor.process(request).await {
            Ok(result) => Ok(result),
            Err(err) => {
                let context = ErrorContext {
                    session_id: Some(session_id),
                    organization_id: Some(organization_id),
                    error_code: Some(err.code().to_string()),
                    elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    user_message: Some(user_message),
                    extra: Default::default(),
                };
                self.track(&err, context).await;
                Err(err)
            }
        }
    }

    async fn track(&self, err: &ChatError, context: ErrorContext) {
        error!(error = %err, code = %err.code(), "chat message processing failed");
        if let Err(tracking_err) = self
            .error_tracking
            .track_error(&err.to_string(), context)
            .await
        {
            warn!(error = %tracking_err, "failed to track chat processing error");
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryErrorTracker;
    use crate::ports::AIError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Processor that counts calls and always fails with the given error.
    struct FailingProcessor {
        calls: AtomicUsize,
        error: ChatError,
    }

    impl FailingProcessor {
        fn new(error: ChatError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                error,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatMessageProcessor for FailingProcessor {
        async fn process(
            &self,
            _request: ProcessChatMessageRequest,
        ) -> Result<ProcessChatMessageResult, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    fn request(organization_id: &str, message: &str) -> ProcessChatMessageRequest {
        ProcessChatMessageRequest::new(
            "6f1c2f5e-2a51-4b8e-9a55-0a4f7d0e4b11",
            organization_id,
            message,
        )
    }

    mod organization_validation {
        use super::*;

        async fn assert_rejected(organization_id: &str) {
            let processor = Arc::new(FailingProcessor::new(AIError::timeout(30).into()));
            let tracker = Arc::new(InMemoryErrorTracker::new());
            let use_case = ProcessChatMessageUseCase::new(processor.clone(), tracker.clone());

            let err = use_case
                .execute(request(organization_id, "Hi"))
                .await
                .unwrap_err();

            assert!(matches!(err, ChatError::Validation(_)));
            assert_eq!(processor.calls(), 0);
            assert!(tracker.recorded().is_empty());
        }

        #[tokio::test]
        async fn empty_is_rejected() {
            assert_rejected("").await;
        }

        #[tokio::test]
        async fn whitespace_is_rejected() {
            assert_rejected("   ").await;
        }

        #[tokio::test]
        async fn missing_is_rejected() {
            let json = r#"{"user_message": "Hi", "session_id": "6f1c2f5e-2a51-4b8e-9a55-0a4f7d0e4b11"}"#;
            let request: ProcessChatMessageRequest = serde_json::from_str(json).unwrap();
            let processor = Arc::new(FailingProcessor::new(AIError::timeout(30).into()));
            let use_case =
                ProcessChatMessageUseCase::new(processor.clone(), Arc::new(InMemoryErrorTracker::new()));

            let err = use_case.execute(request).await.unwrap_err();
            assert!(matches!(err, ChatError::Validation(_)));
            assert_eq!(processor.calls(), 0);
        }
    }

    mod error_tracking {
        use super::*;

        #[tokio::test]
        async fn failure_is_tracked_and_returned_unchanged() {
            let processor = Arc::new(FailingProcessor::new(AIError::timeout(30).into()));
            let tracker = Arc::new(InMemoryErrorTracker::new());
            let use_case = ProcessChatMessageUseCase::new(processor, tracker.clone());

            let err = use_case.execute(request("org-1", "Hi")).await.unwrap_err();

            assert!(matches!(
                err,
                ChatError::AIInteraction(AIError::Timeout { timeout_secs: 30 })
            ));
            let recorded = tracker.recorded();
            assert_eq!(recorded.len(), 1);
            let (_, context) = &recorded[0];
            assert_eq!(context.organization_id.as_deref(), Some("org-1"));
            assert_eq!(context.error_code.as_deref(), Some("AI_TIMEOUT"));
            assert_eq!(context.user_message.as_deref(), Some("Hi"));
        }

        #[tokio::test]
        async fn tracked_message_is_truncated() {
            let processor = Arc::new(FailingProcessor::new(AIError::timeout(30).into()));
            let tracker = Arc::new(InMemoryErrorTracker::new());
            let use_case = ProcessChatMessageUseCase::new(processor, tracker.clone());
            let long_message = "é".repeat(250);

            use_case
                .execute(request("org-1", &long_message))
                .await
                .unwrap_err();

            let (_, context) = &tracker.recorded()[0];
            assert_eq!(context.user_message.as_ref().unwrap().chars().count(), 100);
        }

        #[tokio::test]
        async fn tracking_failure_does_not_replace_error() {
            let processor = Arc::new(FailingProcessor::new(AIError::AuthenticationFailed.into()));
            let use_case =
                ProcessChatMessageUseCase::new(processor, Arc::new(InMemoryErrorTracker::failing()));

            let err = use_case.execute(request("org-1", "Hi")).await.unwrap_err();
            assert!(matches!(
                err,
                ChatError::AIInteraction(AIError::AuthenticationFailed)
            ));
        }
    }
}
