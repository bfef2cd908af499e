//! Web search trait for pain discovery.
//!
//! Abstracts over search providers (Tavily today). The pipeline treats every
//! search failure as non-fatal: a dead provider degrades the run to the
//! ungrounded fallback prompt instead of failing it.

use async_trait::async_trait;

use crate::error::Result;

/// One search call.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: usize,
    /// Allow-list of source domains the provider should restrict itself to.
    pub include_domains: Vec<String>,
}

/// A single result returned by the provider.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
}

/// Web search seam.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Run one query and return candidate documents.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>>;
}
