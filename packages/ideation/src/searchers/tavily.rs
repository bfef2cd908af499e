//! Tavily search provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{GenerationError, Result};
use crate::traits::{SearchHit, SearchQuery, WebSearcher};

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Provider-level failures worth distinguishing in logs.
#[derive(Debug, Error)]
pub enum TavilyError {
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Tavily request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Tavily API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse Tavily response: {0}")]
    Parse(#[source] reqwest::Error),
}

/// Tavily API client for web search.
pub struct TavilySearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct TavilyRequest {
    api_key: String,
    query: String,
    search_depth: &'static str,
    max_results: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include_domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    content: String,
    #[serde(default)]
    score: f64,
}

impl TavilySearcher {
    /// Create a new Tavily searcher.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GenerationError::search(TavilyError::Client(e)))?;

        Ok(Self {
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let request = TavilyRequest {
            api_key: self.api_key.clone(),
            query: query.query.clone(),
            // Advanced depth surfaces forum/discussion content the pain
            // queries are after.
            search_depth: "advanced",
            max_results: query.max_results,
            include_domains: query.include_domains.clone(),
        };

        let response = self
            .client
            .post(TAVILY_ENDPOINT)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::search(TavilyError::Network(e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::search(TavilyError::Api { status, body }));
        }

        let tavily_response: TavilyResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::search(TavilyError::Parse(e)))?;

        Ok(tavily_response
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
                score: r.score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_domains_only_when_present() {
        let with = TavilyRequest {
            api_key: "k".into(),
            query: "q".into(),
            search_depth: "advanced",
            max_results: 10,
            include_domains: vec!["reddit.com".into()],
        };
        let json = serde_json::to_value(&with).unwrap();
        assert_eq!(json["include_domains"][0], "reddit.com");
        assert_eq!(json["search_depth"], "advanced");

        let without = TavilyRequest {
            include_domains: vec![],
            ..with
        };
        let json = serde_json::to_value(&without).unwrap();
        assert!(json.get("include_domains").is_none());
    }

    #[test]
    fn response_score_defaults_to_zero() {
        let parsed: TavilyResponse = serde_json::from_str(
            r#"{"results": [{"title": "t", "url": "https://reddit.com/a", "content": "c"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.results[0].score, 0.0);
    }
}
