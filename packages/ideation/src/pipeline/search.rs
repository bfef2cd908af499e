//! Pain search: query building and result aggregation.
//!
//! Builds up to 3 query variants from direction-derived key terms and a
//! fixed set of pain-indicating phrases, constrained to a small allow-list
//! of source domains. Query-level failures are isolated; the caller only
//! ever sees an aggregated, URL-deduplicated document list.

use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::config::GenerationConfig;
use crate::traits::{SearchHit, SearchQuery, WebSearcher};
use crate::types::SourceDocument;

/// Pain-indicating keyword phrases; the top 3 are used per request.
const PAIN_KEYWORDS: &[&str] = &[
    "problem struggle pain",
    "frustrating annoying difficult",
    "hate worst issue",
    "complaint need solution",
    "looking for tool help",
];

/// Source domains where real user pain discussions live.
const SOURCE_DOMAINS: &[&str] = &[
    "reddit.com",
    "indiehackers.com",
    "news.ycombinator.com",
    "producthunt.com",
];

const QUERY_VARIANTS: usize = 3;
const MAX_KEY_TERMS: usize = 4;

const STOP_WORDS: &[&str] = &[
    "для", "и", "в", "на", "с", "по", "или", "the", "and", "or", "for",
];

/// Searches for real user pain discussions related to a business direction.
pub struct PainSearch {
    searcher: Arc<dyn WebSearcher>,
    config: GenerationConfig,
}

impl PainSearch {
    pub fn new(searcher: Arc<dyn WebSearcher>, config: GenerationConfig) -> Self {
        Self { searcher, config }
    }

    /// Run all query variants and aggregate results.
    ///
    /// Never fails: a provider that errors on every query simply yields an
    /// empty list, which degrades the pipeline to its fallback prompt.
    pub async fn search_pains(&self, direction: &str) -> Vec<SourceDocument> {
        let queries = build_pain_queries(direction);
        let mut all_hits: Vec<SearchHit> = Vec::new();

        for query_text in &queries {
            let query = SearchQuery {
                query: query_text.clone(),
                max_results: self.config.search_max_results,
                include_domains: SOURCE_DOMAINS.iter().map(|d| d.to_string()).collect(),
            };

            match self.searcher.search(&query).await {
                Ok(hits) => {
                    info!(query = %query_text, results = hits.len(), "pain search query done");
                    all_hits.extend(hits);
                }
                Err(e) => {
                    warn!(query = %query_text, error = %e, "pain search query failed, skipping");
                }
            }
        }

        let documents = deduplicate_by_url(all_hits);
        let cap = self.config.search_max_results * 2;

        info!(
            direction = %direction,
            unique = documents.len(),
            cap,
            "pain search finished"
        );

        documents.into_iter().take(cap).collect()
    }
}

/// Build up to 3 pain-focused query variants for a direction.
pub fn build_pain_queries(direction: &str) -> Vec<String> {
    let key_terms = extract_key_terms(direction);

    PAIN_KEYWORDS
        .iter()
        .take(QUERY_VARIANTS)
        .map(|pain_kw| format!("{} {}", key_terms, pain_kw))
        .collect()
}

/// Extract key terms from the direction: lowercase, drop stop words, keep
/// the first few meaningful words.
fn extract_key_terms(direction: &str) -> String {
    direction
        .to_lowercase()
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word))
        .take(MAX_KEY_TERMS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop hits whose URL was already seen, converting survivors to documents.
fn deduplicate_by_url(hits: Vec<SearchHit>) -> Vec<SourceDocument> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();

    for hit in hits {
        if hit.url.is_empty() || !seen.insert(hit.url.clone()) {
            continue;
        }
        let source = extract_domain(&hit.url);
        unique.push(SourceDocument {
            title: hit.title,
            url: hit.url,
            content: hit.content,
            score: hit.score,
            source,
        });
    }

    unique
}

/// Extract the bare domain from a URL ("www." stripped), or "unknown".
fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            title: "t".into(),
            url: url.into(),
            content: "c".into(),
            score: 0.5,
        }
    }

    #[test]
    fn builds_three_query_variants() {
        let queries = build_pain_queries("B2B SaaS для стартапов");
        assert_eq!(queries.len(), 3);
        assert!(queries[0].starts_with("b2b saas стартапов"));
        assert!(queries[0].contains("problem struggle pain"));
    }

    #[test]
    fn stop_words_filtered_and_terms_capped() {
        let terms = extract_key_terms("инструменты для команд и the remote work analytics");
        let words: Vec<&str> = terms.split_whitespace().collect();
        assert_eq!(words.len(), 4);
        assert!(!words.contains(&"для"));
        assert!(!words.contains(&"the"));
    }

    #[test]
    fn deduplicates_by_url() {
        let docs = deduplicate_by_url(vec![
            hit("https://reddit.com/a"),
            hit("https://reddit.com/a"),
            hit("https://reddit.com/b"),
        ]);
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn domain_extracted_without_www() {
        assert_eq!(extract_domain("https://www.reddit.com/r/saas"), "reddit.com");
        assert_eq!(extract_domain("not a url"), "unknown");
    }

    #[tokio::test]
    async fn failing_queries_degrade_to_empty() {
        use crate::testing::MockWebSearcher;

        let search = PainSearch::new(
            Arc::new(MockWebSearcher::failing()),
            GenerationConfig::default(),
        );
        let documents = search.search_pains("B2B SaaS").await;
        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn aggregates_and_caps_at_twice_max_results() {
        use crate::testing::MockWebSearcher;

        // 30 distinct hits per query; cap is 2 * 10 = 20
        let hits: Vec<SearchHit> = (0..30)
            .map(|i| hit(&format!("https://reddit.com/{}", i)))
            .collect();
        let search = PainSearch::new(
            Arc::new(MockWebSearcher::with_hits(hits)),
            GenerationConfig::default(),
        );
        let documents = search.search_pains("B2B SaaS").await;
        assert_eq!(documents.len(), 20);
    }
}
