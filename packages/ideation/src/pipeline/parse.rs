//! Parsing and normalization of model output.
//!
//! Models wrap JSON in markdown fences and sometimes in a top-level object;
//! both wrappers are stripped transparently. Everything else that deviates
//! from the contract is either skipped per-object (missing fields) or fatal
//! for the run (output that is not a JSON array at all).

use serde_json::Value;
use tracing::warn;

use crate::config::GenerationConfig;
use crate::error::{GenerationError, Result};
use crate::types::{AnalogueDraft, ConfidenceLevel, EvidenceDraft, IdeaDraft};

const MAX_TITLE_CHARS: usize = 200;
const MAX_SEGMENT_CHARS: usize = 200;
const MAX_URL_CHARS: usize = 500;

const DEFAULT_BRIEF_EVIDENCE: &str = "Доказательства анализируются...";
const DEFAULT_PLAN: &str = "План генерируется...";
const DEFAULT_ANALOGUE_NAME: &str = "Аналог";
const DEFAULT_ANALOGUE_DESCRIPTION: &str = "Описание недоступно";
const DEFAULT_ANALOGUE_URL: &str = "https://example.com";

/// Strip a single leading/trailing markdown fence if present.
///
/// Models often answer with ```json ... ``` around the payload; the first
/// and last lines are dropped so the inner JSON parses.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < 2 {
        return trimmed.to_string();
    }
    lines[1..lines.len() - 1].join("\n")
}

/// Parse model output as a JSON array of objects, unwrapping an optional
/// `{"<wrapper_key>": [...]}` object shape. Fatal on anything else.
pub fn parse_object_array(text: &str, wrapper_key: &str) -> Result<Vec<Value>> {
    let cleaned = strip_code_fence(text);

    let parsed: Value = serde_json::from_str(&cleaned).map_err(|e| {
        let preview: String = cleaned.chars().take(200).collect();
        warn!(error = %e, preview = %preview, "model output is not valid JSON");
        GenerationError::ResponseParse(e.to_string())
    })?;

    match parsed {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove(wrapper_key) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(GenerationError::ResponseParse(format!(
                "expected a JSON array or an object with \"{}\"",
                wrapper_key
            ))),
        },
        _ => Err(GenerationError::ResponseParse(
            "expected a JSON array".to_string(),
        )),
    }
}

/// Truncate to at most `max` characters (not bytes — titles are UTF-8).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Normalize a plan field: a string passes through, a list of steps is
/// flattened into a bulleted string, anything else gets the default.
pub fn flatten_plan(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => {
            let lines: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|step| format!("- {}", step))
                .collect();
            if lines.is_empty() {
                DEFAULT_PLAN.to_string()
            } else {
                lines.join("\n")
            }
        }
        _ => DEFAULT_PLAN.to_string(),
    }
}

/// Validate and normalize one idea object.
///
/// Returns `None` (skip, not fatal) when any required field is missing or
/// not a string.
pub fn normalize_idea(value: &Value, config: &GenerationConfig) -> Option<IdeaDraft> {
    let title = value.get("title")?.as_str()?;
    let pain_description = value.get("pain_description")?.as_str()?;
    let segment = value.get("segment")?.as_str()?;
    let confidence_raw = value.get("confidence_level")?.as_str()?;

    let brief_evidence = value
        .get("brief_evidence")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_BRIEF_EVIDENCE)
        .to_string();

    let detailed_evidence = match value.get("detailed_evidence") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    let analogues = value
        .get("analogues")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .take(config.max_analogues)
                .map(normalize_analogue)
                .collect()
        })
        .unwrap_or_default();

    let evidence = value
        .get("evidence")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(normalize_evidence).collect())
        .unwrap_or_default();

    Some(IdeaDraft {
        title: truncate_chars(title, MAX_TITLE_CHARS),
        pain_description: pain_description.to_string(),
        segment: truncate_chars(segment, MAX_SEGMENT_CHARS),
        confidence_level: ConfidenceLevel::from_loose(confidence_raw),
        brief_evidence,
        detailed_evidence,
        plan_7days: flatten_plan(value.get("plan_7days")),
        plan_30days: flatten_plan(value.get("plan_30days")),
        analogues,
        evidence,
    })
}

fn normalize_analogue(value: &Value) -> AnalogueDraft {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ANALOGUE_NAME);
    let description = value
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ANALOGUE_DESCRIPTION);
    let url = value
        .get("url")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_ANALOGUE_URL);

    AnalogueDraft {
        name: truncate_chars(name, MAX_TITLE_CHARS),
        description: description.to_string(),
        url: truncate_chars(url, MAX_URL_CHARS),
    }
}

fn normalize_evidence(value: &Value) -> Option<EvidenceDraft> {
    let pattern_description = value.get("pattern_description")?.as_str()?;

    Some(EvidenceDraft {
        pattern_description: pattern_description.to_string(),
        source_type: value
            .get("source_type")
            .and_then(Value::as_str)
            .unwrap_or("discussion")
            .to_string(),
        source_url: value
            .get("source_url")
            .and_then(Value::as_str)
            .map(|s| truncate_chars(s, MAX_URL_CHARS)),
        example_quote: value
            .get("example_quote")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}
