//! Core types shared by the pipeline, stores, and the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Run lifecycle
// =============================================================================

/// Run lifecycle status. Transitions are one-directional:
/// `pending → running → {completed | failed}`. A failed run is never
/// re-entered; the only corrective action is creating a new run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(format!("invalid run status: {}", s)),
        }
    }
}

impl RunStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Pipeline progress stage. Stored as its human-readable label and mapped
/// to a coarse percentage for pollers; an unrecognized label maps to 0%.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SignalSearch,
    PainAnalysis,
    IdeaGeneration,
    Saving,
    Finished,
}

impl Stage {
    /// The label persisted in `runs.current_stage` and shown to clients.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::SignalSearch => "Поиск сигналов",
            Stage::PainAnalysis => "Анализ болей",
            Stage::IdeaGeneration => "Генерация идей",
            Stage::Saving => "Сохранение результатов",
            Stage::Finished => "Завершено",
        }
    }

    /// Coarse progress percentage for this stage.
    pub fn percent(&self) -> u8 {
        match self {
            Stage::SignalSearch => 20,
            Stage::PainAnalysis => 40,
            Stage::IdeaGeneration => 60,
            Stage::Saving => 90,
            Stage::Finished => 100,
        }
    }

    /// All stages in pipeline order.
    pub fn all() -> [Stage; 5] {
        [
            Stage::SignalSearch,
            Stage::PainAnalysis,
            Stage::IdeaGeneration,
            Stage::Saving,
            Stage::Finished,
        ]
    }
}

/// Map a stored stage label to its progress percentage (unknown → 0).
pub fn progress_percent(stage_label: Option<&str>) -> u8 {
    let Some(label) = stage_label else { return 0 };
    Stage::all()
        .iter()
        .find(|s| s.label() == label)
        .map(|s| s.percent())
        .unwrap_or(0)
}

/// The slice of a run the pipeline needs to start working.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub id: Uuid,
    pub status: RunStatus,
    pub optional_direction: Option<String>,
}

// =============================================================================
// Search and extraction
// =============================================================================

/// A raw document found by pain search, fed to the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
    /// Domain the document came from (e.g. "reddit.com")
    pub source: String,
}

/// Confidence the extractor or generator assigns to a pain or idea.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "high"),
            ConfidenceLevel::Medium => write!(f, "medium"),
            ConfidenceLevel::Low => write!(f, "low"),
        }
    }
}

impl ConfidenceLevel {
    /// Parse a model-supplied value, defaulting to `medium` on anything odd.
    pub fn from_loose(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "high" => ConfidenceLevel::High,
            "low" => ConfidenceLevel::Low,
            _ => ConfidenceLevel::Medium,
        }
    }
}

/// A structured, evidence-backed user problem statement.
///
/// Transient: produced by the pain extractor, consumed immediately by the
/// idea generator, never persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedPain {
    pub pain_description: String,
    pub segment: String,
    pub evidence_quotes: Vec<String>,
    pub confidence_level: ConfidenceLevel,
}

// =============================================================================
// Parsed idea drafts (pipeline output, pre-persistence)
// =============================================================================

/// One validated, normalized idea ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct IdeaDraft {
    pub title: String,
    pub pain_description: String,
    pub segment: String,
    pub confidence_level: ConfidenceLevel,
    pub brief_evidence: String,
    pub detailed_evidence: Option<String>,
    pub plan_7days: String,
    pub plan_30days: String,
    pub analogues: Vec<AnalogueDraft>,
    pub evidence: Vec<EvidenceDraft>,
}

/// Competitor/reference product attached to an idea.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogueDraft {
    pub name: String,
    pub description: String,
    pub url: String,
}

/// Supporting pattern record attached to an idea.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceDraft {
    pub pattern_description: String,
    pub source_type: String,
    pub source_url: Option<String>,
    pub example_quote: Option<String>,
}

/// Timestamp helper used by stores.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips() {
        for status in [
            RunStatus::Pending,
            RunStatus::Running,
            RunStatus::Completed,
            RunStatus::Failed,
        ] {
            assert_eq!(RunStatus::from_str(&status.to_string()).unwrap(), status);
        }
        assert!(RunStatus::from_str("paused").is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }

    #[test]
    fn stage_percent_mapping() {
        assert_eq!(progress_percent(Some("Поиск сигналов")), 20);
        assert_eq!(progress_percent(Some("Анализ болей")), 40);
        assert_eq!(progress_percent(Some("Генерация идей")), 60);
        assert_eq!(progress_percent(Some("Сохранение результатов")), 90);
        assert_eq!(progress_percent(Some("Завершено")), 100);
    }

    #[test]
    fn unknown_stage_maps_to_zero() {
        assert_eq!(progress_percent(Some("что-то новое")), 0);
        assert_eq!(progress_percent(None), 0);
    }

    #[test]
    fn confidence_from_loose_defaults_to_medium() {
        assert_eq!(ConfidenceLevel::from_loose("HIGH"), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_loose(" low "), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_loose("certain"), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_loose(""), ConfidenceLevel::Medium);
    }
}
