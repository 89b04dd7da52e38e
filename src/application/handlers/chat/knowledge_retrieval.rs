//! KnowledgeRetrievalCoordinator - contextual defaults over the knowledge search port.

use std::sync::Arc;

use crate::domain::conversation::{IntentResult, IntentType};
use crate::ports::{KnowledgeQuery, KnowledgeSearch, KnowledgeSearchError, KnowledgeSearchResult};

/// Results returned by a standard search.
pub const STANDARD_MAX_RESULTS: usize = 5;
/// Relevance floor of a standard search.
pub const STANDARD_MIN_RELEVANCE: f64 = 0.5;
/// Results returned by a knowledge-intensive search.
pub const ENHANCED_MAX_RESULTS: usize = 10;
/// Relevance floor of a knowledge-intensive search.
pub const ENHANCED_MIN_RELEVANCE: f64 = 0.3;
/// Accumulated topics after which a conversation counts as knowledge-intensive.
pub const KNOWLEDGE_INTENSIVE_TOPICS: usize = 3;

/// Optional overrides for a standard retrieval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalContext {
    pub max_results: Option<usize>,
    pub min_relevance_score: Option<f64>,
    pub intent: Option<IntentResult>,
}

/// Queries the knowledge capability, if one is configured.
#[derive(Clone, Default)]
pub struct KnowledgeRetrievalCoordinator {
    search: Option<Arc<dyn KnowledgeSearch>>,
}

impl KnowledgeRetrievalCoordinator {
    pub fn new(search: Arc<dyn KnowledgeSearch>) -> Self {
        Self {
            search: Some(search),
        }
    }

    /// A coordinator with no knowledge capability. Every retrieval yields `Ok(None)`.
    pub fn unconfigured() -> Self {
        Self { search: None }
    }

    pub fn is_configured(&self) -> bool {
        self.search.is_some()
    }

    /// Standard retrieval (5 results, relevance >= 0.5 unless overridden).
    ///
    /// Returns `Ok(None)` when no capability is configured, which is distinct
    /// from `Ok(Some(empty))`. Search errors are returned unchanged.
    pub async fn retrieve_knowledge(
        &self,
        query: &str,
        context: Option<RetrievalContext>,
    ) -> Result<Option<KnowledgeSearchResult>, KnowledgeSearchError> {
        let Some(search) = &self.search else {
            return Ok(None);
        };
        let context = context.unwrap_or_default();

        let result = search
            .search(KnowledgeQuery {
                user_query: query.to_string(),
                intent_result: context.intent,
                conversation_history: None,
                user_preferences: None,
                max_results: context.max_results.unwrap_or(STANDARD_MAX_RESULTS),
                min_relevance_score: context
                    .min_relevance_score
                    .unwrap_or(STANDARD_MIN_RELEVANCE),
            })
            .await?;

        Ok(Some(result))
    }

    /// Wider retrieval (10 results, relevance >= 0.3) carrying history and preferences.
    pub async fn retrieve_knowledge_with_enhanced_context(
        &self,
        query: &str,
        conversation_history: Vec<String>,
        user_preferences: Vec<String>,
        intent: Option<IntentResult>,
    ) -> Result<Option<KnowledgeSearchResult>, KnowledgeSearchError> {
        let Some(search) = &self.search else {
            return Ok(None);
        };

        let result = search
            .search(KnowledgeQuery {
                user_query: query.to_string(),
                intent_result: intent,
                conversation_history: Some(conversation_history),
                user_preferences: Some(user_preferences),
                max_results: ENHANCED_MAX_RESULTS,
                min_relevance_score: ENHANCED_MIN_RELEVANCE,
            })
            .await?;

        Ok(Some(result))
    }

    /// True when the local intent or the accumulated topics call for the wider search.
    pub fn is_knowledge_intensive(intent: &IntentResult, topic_count: usize) -> bool {
        matches!(
            intent.intent,
            IntentType::Question | IntentType::ProductInquiry | IntentType::Support
        ) || topic_count >= KNOWLEDGE_INTENSIVE_TOPICS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingSearch {
        queries: Mutex<Vec<KnowledgeQuery>>,
        fail: bool,
    }

    impl RecordingSearch {
        fn new() -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn queries(&self) -> Vec<KnowledgeQuery> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl KnowledgeSearch for RecordingSearch {
        async fn search(
            &self,
            query: KnowledgeQuery,
        ) -> Result<KnowledgeSearchResult, KnowledgeSearchError> {
            self.queries.lock().unwrap().push(query);
            if self.fail {
                return Err(KnowledgeSearchError::Unavailable("index offline".into()));
            }
            Ok(KnowledgeSearchResult::default())
        }
    }

    fn intent(kind: IntentType) -> IntentResult {
        IntentResult {
            intent: kind,
            confidence: 0.7,
            topics: vec![],
        }
    }

    #[tokio::test]
    async fn unconfigured_returns_none() {
        let coordinator = KnowledgeRetrievalCoordinator::unconfigured();
        let result = coordinator.retrieve_knowledge("pricing", None).await.unwrap();
        assert!(result.is_none());
        assert!(!coordinator.is_configured());
    }

    #[tokio::test]
    async fn configured_empty_result_is_some() {
        let search = Arc::new(RecordingSearch::new());
        let coordinator = KnowledgeRetrievalCoordinator::new(search);
        let result = coordinator.retrieve_knowledge("pricing", None).await.unwrap();
        assert_eq!(result, Some(KnowledgeSearchResult::default()));
    }

    #[tokio::test]
    async fn standard_search_uses_defaults() {
        let search = Arc::new(RecordingSearch::new());
        let coordinator = KnowledgeRetrievalCoordinator::new(search.clone());
        coordinator.retrieve_knowledge("pricing", None).await.unwrap();

        let query = &search.queries()[0];
        assert_eq!(query.max_results, 5);
        assert_eq!(query.min_relevance_score, 0.5);
        assert!(query.conversation_history.is_none());
    }

    #[tokio::test]
    async fn standard_search_honours_overrides() {
        let search = Arc::new(RecordingSearch::new());
        let coordinator = KnowledgeRetrievalCoordinator::new(search.clone());
        let context = RetrievalContext {
            max_results: Some(2),
            min_relevance_score: Some(0.9),
            intent: Some(intent(IntentType::PricingInquiry)),
        };
        coordinator
            .retrieve_knowledge("pricing", Some(context))
            .await
            .unwrap();

        let query = &search.queries()[0];
        assert_eq!(query.max_results, 2);
        assert_eq!(query.min_relevance_score, 0.9);
        assert_eq!(query.intent_result.as_ref().map(|i| i.intent), Some(IntentType::PricingInquiry));
    }

    #[tokio::test]
    async fn enhanced_search_widens_and_carries_context() {
        let search = Arc::new(RecordingSearch::new());
        let coordinator = KnowledgeRetrievalCoordinator::new(search.clone());
        coordinator
            .retrieve_knowledge_with_enhanced_context(
                "how does sso work?",
                vec!["hello".into()],
                vec!["security".into()],
                Some(intent(IntentType::Question)),
            )
            .await
            .unwrap();

        let query = &search.queries()[0];
        assert_eq!(query.max_results, 10);
        assert_eq!(query.min_relevance_score, 0.3);
        assert_eq!(query.conversation_history, Some(vec!["hello".to_string()]));
        assert_eq!(query.user_preferences, Some(vec!["security".to_string()]));
    }

    #[tokio::test]
    async fn search_errors_propagate_unchanged() {
        let coordinator = KnowledgeRetrievalCoordinator::new(Arc::new(RecordingSearch::failing()));
        let err = coordinator.retrieve_knowledge("pricing", None).await.unwrap_err();
        assert_eq!(err, KnowledgeSearchError::Unavailable("index offline".into()));
    }

    #[test]
    fn knowledge_intensive_by_intent_or_topics() {
        assert!(KnowledgeRetrievalCoordinator::is_knowledge_intensive(&intent(IntentType::Question), 0));
        assert!(KnowledgeRetrievalCoordinator::is_knowledge_intensive(&intent(IntentType::Support), 0));
        assert!(!KnowledgeRetrievalCoordinator::is_knowledge_intensive(&intent(IntentType::Greeting), 2));
        assert!(KnowledgeRetrievalCoordinator::is_knowledge_intensive(&intent(IntentType::Greeting), 3));
    }
}
