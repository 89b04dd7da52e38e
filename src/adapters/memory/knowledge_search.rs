//! In-memory knowledge search over registered articles.
//!
//! Relevance is the fraction of query terms (three or more characters)
//! found in an article's title or content.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use crate::ports::{
    KnowledgeItem, KnowledgeQuery, KnowledgeSearch, KnowledgeSearchError, KnowledgeSearchResult,
};

const MIN_TERM_CHARS: usize = 3;

#[derive(Debug, Clone)]
struct Article {
    id: String,
    title: String,
    content: String,
    terms: HashSet<String>,
}

/// In-memory implementation of the KnowledgeSearch port.
#[derive(Debug, Default)]
pub struct InMemoryKnowledgeSearch {
    articles: Vec<Article>,
    source: Option<String>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryKnowledgeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A search whose every call fails as unavailable.
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn with_article(
        mut self,
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let content = content.into();
        let terms = terms(&format!("{} {}", title, content));
        self.articles.push(Article {
            id: id.into(),
            title,
            content,
            terms,
        });
        self
    }

    /// Source label attached to every hit.
    pub fn with_source(self, source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..self
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl KnowledgeSearch for InMemoryKnowledgeSearch {
    async fn search(&self, query: KnowledgeQuery) -> Result<KnowledgeSearchResult, KnowledgeSearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(KnowledgeSearchError::Unavailable(
                "knowledge index offline".to_string(),
            ));
        }
        if query.max_results == 0 {
            return Err(KnowledgeSearchError::InvalidQuery(
                "max_results must be greater than zero".to_string(),
            ));
        }

        let started = Instant::now();
        let query_terms = terms(&query.user_query);

        let mut hits: Vec<KnowledgeItem> = if query_terms.is_empty() {
            Vec::new()
        } else {
            self.articles
                .iter()
                .filter_map(|article| {
                    let matched = query_terms.intersection(&article.terms).count();
                    let score = matched as f64 / query_terms.len() as f64;
                    (matched > 0 && score >= query.min_relevance_score).then(|| KnowledgeItem {
                        id: article.id.clone(),
                        title: article.title.clone(),
                        content: article.content.clone(),
                        relevance_score: score,
                        source: self.source.clone(),
                    })
                })
                .collect()
        };
        hits.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        let total_found = hits.len();
        hits.truncate(query.max_results);

        Ok(KnowledgeSearchResult {
            items: hits,
            total_found,
            search_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}
