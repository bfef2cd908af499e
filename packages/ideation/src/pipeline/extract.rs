//! Pain extraction: raw documents → structured pains.
//!
//! Documents are split into fixed-size batches to respect token limits; each
//! batch is one low-temperature generation call. Per-batch failures (HTTP
//! error, malformed JSON) are isolated — logged and skipped, never aborting
//! the whole extraction. Merged results are deduplicated by a coarse prefix
//! heuristic; semantic clustering is explicitly deferred.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::GenerationConfig;
use crate::pipeline::parse;
use crate::prompts;
use crate::traits::{GenerationRequest, TextGenerator};
use crate::types::{ConfidenceLevel, ExtractedPain, SourceDocument};

/// Prefix length for the deduplication key.
const DEDUPE_PREFIX_CHARS: usize = 100;

/// Merged quote count above which confidence is upgraded to high.
const HIGH_CONFIDENCE_QUOTES: usize = 3;

/// Extracts structured user pains from raw search results.
pub struct PainExtractor {
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl PainExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, config: GenerationConfig) -> Self {
        Self { generator, config }
    }

    /// Extract and merge pains from all documents.
    ///
    /// Never fails as a whole: batches that error are skipped.
    pub async fn extract_pains(
        &self,
        documents: &[SourceDocument],
        direction: &str,
    ) -> Vec<ExtractedPain> {
        if documents.is_empty() {
            warn!("no search results to analyze");
            return Vec::new();
        }

        let batches: Vec<&[SourceDocument]> =
            documents.chunks(self.config.extract_batch_size).collect();
        let batch_count = batches.len();

        info!(documents = documents.len(), batches = batch_count, "analyzing search results");

        let mut all_pains = Vec::new();
        for (idx, batch) in batches.into_iter().enumerate() {
            match self.analyze_batch(batch, direction).await {
                Ok(pains) => all_pains.extend(pains),
                Err(e) => {
                    error!(batch = idx + 1, total = batch_count, error = %e, "batch failed, skipping");
                }
            }
        }

        let merged = merge_similar_pains(all_pains);
        info!(unique = merged.len(), "pain extraction finished");
        merged
    }

    /// One generation call for one batch of documents.
    async fn analyze_batch(
        &self,
        batch: &[SourceDocument],
        direction: &str,
    ) -> crate::error::Result<Vec<ExtractedPain>> {
        let prompt = prompts::build_extraction_prompt(direction, batch);
        let request = GenerationRequest::new(
            prompt,
            self.config.extract_temperature,
            self.config.extract_max_tokens,
        )
        .with_system(prompts::EXTRACT_SYSTEM_PROMPT);

        let response = self.generator.generate(request).await?;
        let objects = parse::parse_object_array(&response, "pains")?;

        Ok(objects.iter().filter_map(parse_pain).collect())
    }
}

/// Parse one pain object; entries missing required fields are dropped.
fn parse_pain(value: &Value) -> Option<ExtractedPain> {
    let pain_description = value.get("pain_description")?.as_str()?;
    let segment = value.get("segment").and_then(Value::as_str).unwrap_or("");

    let evidence_quotes = value
        .get("evidence_quotes")
        .and_then(Value::as_array)
        .map(|quotes| {
            quotes
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let confidence_level = value
        .get("confidence_level")
        .and_then(Value::as_str)
        .map(ConfidenceLevel::from_loose)
        .unwrap_or(ConfidenceLevel::Medium);

    Some(ExtractedPain {
        pain_description: pain_description.to_string(),
        segment: segment.to_string(),
        evidence_quotes,
        confidence_level,
    })
}

/// Merge pains sharing the same lowercased 100-character description prefix.
///
/// On merge the evidence quote sets are unioned (first-seen order kept) and
/// confidence is upgraded to high once the merged quote count exceeds 3.
/// Coarse by design — not semantic clustering.
pub fn merge_similar_pains(pains: Vec<ExtractedPain>) -> Vec<ExtractedPain> {
    if pains.len() <= 1 {
        return pains;
    }

    let mut order: Vec<String> = Vec::new();
    let mut merged: std::collections::HashMap<String, ExtractedPain> = std::collections::HashMap::new();

    for pain in pains {
        let key = dedupe_key(&pain.pain_description);

        match merged.get_mut(&key) {
            Some(existing) => {
                for quote in pain.evidence_quotes {
                    if !existing.evidence_quotes.contains(&quote) {
                        existing.evidence_quotes.push(quote);
                    }
                }
                if existing.evidence_quotes.len() > HIGH_CONFIDENCE_QUOTES {
                    existing.confidence_level = ConfidenceLevel::High;
                }
            }
            None => {
                order.push(key.clone());
                merged.insert(key, pain);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| merged.remove(&key))
        .collect()
}

fn dedupe_key(description: &str) -> String {
    description
        .chars()
        .take(DEDUPE_PREFIX_CHARS)
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTextGenerator;

    fn pain(description: &str, quotes: &[&str]) -> ExtractedPain {
        ExtractedPain {
            pain_description: description.to_string(),
            segment: "сегмент".to_string(),
            evidence_quotes: quotes.iter().map(|q| q.to_string()).collect(),
            confidence_level: ConfidenceLevel::Medium,
        }
    }

    #[test]
    fn same_prefix_merges_with_quote_union() {
        let shared: String = "a".repeat(100);
        let merged = merge_similar_pains(vec![
            pain(&format!("{} хвост один", shared), &["q1", "q2"]),
            pain(&format!("{} хвост другой", shared), &["q2", "q3"]),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].evidence_quotes, vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn merge_is_case_insensitive() {
        let merged = merge_similar_pains(vec![
            pain("Slow Export Takes Forever", &["q1"]),
            pain("slow export takes forever", &["q2"]),
        ]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn confidence_upgraded_above_three_quotes() {
        let merged = merge_similar_pains(vec![
            pain("slow export", &["q1", "q2"]),
            pain("slow export", &["q3", "q4"]),
        ]);
        assert_eq!(merged[0].evidence_quotes.len(), 4);
        assert_eq!(merged[0].confidence_level, ConfidenceLevel::High);
    }

    #[test]
    fn three_quotes_is_not_enough_for_upgrade() {
        let merged = merge_similar_pains(vec![
            pain("slow export", &["q1", "q2"]),
            pain("slow export", &["q2", "q3"]),
        ]);
        assert_eq!(merged[0].evidence_quotes.len(), 3);
        assert_eq!(merged[0].confidence_level, ConfidenceLevel::Medium);
    }

    #[test]
    fn distinct_pains_stay_separate_in_input_order() {
        let merged = merge_similar_pains(vec![
            pain("первая боль", &[]),
            pain("вторая боль", &[]),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].pain_description, "первая боль");
    }

    #[test]
    fn pain_without_description_dropped() {
        assert!(parse_pain(&serde_json::json!({"segment": "s"})).is_none());
    }

    fn doc(i: usize) -> SourceDocument {
        SourceDocument {
            title: format!("t{}", i),
            url: format!("https://reddit.com/{}", i),
            content: "c".into(),
            score: 0.5,
            source: "reddit.com".into(),
        }
    }

    #[tokio::test]
    async fn failed_batch_is_isolated() {
        // 20 documents → 2 batches; first succeeds, second errors
        let generator = MockTextGenerator::new();
        generator.push_response(
            r#"[{"pain_description": "боль", "segment": "s", "evidence_quotes": ["q"], "confidence_level": "high"}]"#,
        );
        generator.push_error("model unavailable");

        let extractor = PainExtractor::new(Arc::new(generator), GenerationConfig::default());
        let documents: Vec<SourceDocument> = (0..20).map(doc).collect();
        let pains = extractor.extract_pains(&documents, "B2B SaaS").await;

        assert_eq!(pains.len(), 1);
        assert_eq!(pains[0].confidence_level, ConfidenceLevel::High);
    }

    #[tokio::test]
    async fn malformed_batch_json_is_isolated() {
        let generator = MockTextGenerator::new();
        generator.push_response("definitely not json");

        let extractor = PainExtractor::new(Arc::new(generator), GenerationConfig::default());
        let pains = extractor.extract_pains(&[doc(0)], "B2B SaaS").await;
        assert!(pains.is_empty());
    }

    #[tokio::test]
    async fn pains_wrapper_object_unwrapped() {
        let generator = MockTextGenerator::new();
        generator.push_response(
            r#"{"pains": [{"pain_description": "боль", "segment": "s"}]}"#,
        );

        let extractor = PainExtractor::new(Arc::new(generator), GenerationConfig::default());
        let pains = extractor.extract_pains(&[doc(0)], "B2B SaaS").await;
        assert_eq!(pains.len(), 1);
        assert_eq!(pains[0].confidence_level, ConfidenceLevel::Medium);
    }
}
