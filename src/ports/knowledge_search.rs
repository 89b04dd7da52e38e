//! Knowledge Search Port - relevance search over an organization's knowledge base.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::IntentResult;

/// Port for knowledge-base search.
#[async_trait]
pub trait KnowledgeSearch: Send + Sync {
    /// Returns the items relevant to the query, most relevant first.
    async fn search(&self, query: KnowledgeQuery) -> Result<KnowledgeSearchResult, KnowledgeSearchError>;
}

/// A knowledge search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeQuery {
    pub user_query: String,
    pub intent_result: Option<IntentResult>,
    /// Recent message contents, oldest first.
    pub conversation_history: Option<Vec<String>>,
    /// Topics and interests known for the visitor.
    pub user_preferences: Option<Vec<String>>,
    pub max_results: usize,
    /// Items scoring below this are dropped (0.0 - 1.0).
    pub min_relevance_score: f64,
}

/// One knowledge-base hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Relevance (0.0 - 1.0).
    pub relevance_score: f64,
    #[serde(default)]
    pub source: Option<String>,
}

/// Result of a knowledge search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSearchResult {
    pub items: Vec<KnowledgeItem>,
    /// Matches before `max_results` was applied.
    pub total_found: usize,
    pub search_time_ms: u64,
}

impl KnowledgeSearchResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Knowledge search errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KnowledgeSearchError {
    #[error("knowledge search unavailable: {0}")]
    Unavailable(String),

    #[error("knowledge search timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },

    #[error("invalid knowledge query: {0}")]
    InvalidQuery(String),
}

impl KnowledgeSearchError {
    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, KnowledgeSearchError::InvalidQuery(_))
    }
}
