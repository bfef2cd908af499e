//! No-op searcher for when no search API key is configured.

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::traits::{SearchHit, SearchQuery, WebSearcher};

/// Returns no results for every query.
///
/// Keeps the pipeline runnable without a search provider; every run then
/// takes the ungrounded fallback prompt.
pub struct NoopWebSearcher;

#[async_trait]
impl WebSearcher for NoopWebSearcher {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        warn!(query = %query.query, "no search provider configured, returning no results");
        Ok(vec![])
    }
}
