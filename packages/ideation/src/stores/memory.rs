//! In-memory storage implementation for testing and development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{GenerationError, Result};
use crate::traits::RunStore;
use crate::types::{now, IdeaDraft, PipelineRun, RunStatus, Stage};

/// A run as held in memory; superset of what the pipeline reads back.
#[derive(Debug, Clone)]
pub struct StoredRun {
    pub id: Uuid,
    pub status: RunStatus,
    pub optional_direction: Option<String>,
    pub selected_direction: Option<String>,
    pub current_stage: Option<String>,
    pub error_message: Option<String>,
    pub ideas_count: i32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A persisted idea row with its run linkage.
#[derive(Debug, Clone)]
pub struct StoredIdea {
    pub id: i64,
    pub run_id: Uuid,
    pub order_index: i32,
    pub draft: IdeaDraft,
}

/// In-memory run storage.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
pub struct MemoryRunStore {
    runs: RwLock<HashMap<Uuid, StoredRun>>,
    ideas: RwLock<Vec<StoredIdea>>,
    next_idea_id: RwLock<i64>,
}

impl Default for MemoryRunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRunStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            ideas: RwLock::new(Vec::new()),
            next_idea_id: RwLock::new(1),
        }
    }

    /// Register a fresh pending run, returning its id.
    pub fn insert_run(&self, optional_direction: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.runs.write().unwrap().insert(
            id,
            StoredRun {
                id,
                status: RunStatus::Pending,
                optional_direction: optional_direction.map(str::to_string),
                selected_direction: None,
                current_stage: None,
                error_message: None,
                ideas_count: 0,
                created_at: now(),
                completed_at: None,
            },
        );
        id
    }

    /// Read back a run's full stored state.
    pub fn get_run(&self, run_id: Uuid) -> Option<StoredRun> {
        self.runs.read().unwrap().get(&run_id).cloned()
    }

    /// All ideas for a run, ordered by `order_index`.
    pub fn ideas_for_run(&self, run_id: Uuid) -> Vec<StoredIdea> {
        let mut ideas: Vec<StoredIdea> = self
            .ideas
            .read()
            .unwrap()
            .iter()
            .filter(|idea| idea.run_id == run_id)
            .cloned()
            .collect();
        ideas.sort_by_key(|idea| idea.order_index);
        ideas
    }

    fn update_run<F>(&self, run_id: Uuid, apply: F) -> Result<()>
    where
        F: FnOnce(&mut StoredRun),
    {
        let mut runs = self.runs.write().unwrap();
        let run = runs
            .get_mut(&run_id)
            .ok_or(GenerationError::RunNotFound { run_id })?;
        apply(run);
        Ok(())
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn load_run(&self, run_id: Uuid) -> Result<Option<PipelineRun>> {
        Ok(self.runs.read().unwrap().get(&run_id).map(|run| PipelineRun {
            id: run.id,
            status: run.status,
            optional_direction: run.optional_direction.clone(),
        }))
    }

    async fn mark_running(&self, run_id: Uuid, stage: Stage) -> Result<()> {
        self.update_run(run_id, |run| {
            run.status = RunStatus::Running;
            run.current_stage = Some(stage.label().to_string());
        })
    }

    async fn set_stage(&self, run_id: Uuid, stage: Stage) -> Result<()> {
        self.update_run(run_id, |run| {
            run.current_stage = Some(stage.label().to_string());
        })
    }

    async fn set_selected_direction(&self, run_id: Uuid, direction: &str) -> Result<()> {
        self.update_run(run_id, |run| {
            run.selected_direction = Some(direction.to_string());
        })
    }

    async fn insert_idea(&self, run_id: Uuid, order_index: i32, idea: &IdeaDraft) -> Result<i64> {
        if !self.runs.read().unwrap().contains_key(&run_id) {
            return Err(GenerationError::RunNotFound { run_id });
        }

        let mut next_id = self.next_idea_id.write().unwrap();
        let id = *next_id;
        *next_id += 1;

        self.ideas.write().unwrap().push(StoredIdea {
            id,
            run_id,
            order_index,
            draft: idea.clone(),
        });
        Ok(id)
    }

    async fn mark_completed(&self, run_id: Uuid, ideas_count: i32) -> Result<()> {
        self.update_run(run_id, |run| {
            run.status = RunStatus::Completed;
            run.current_stage = Some(Stage::Finished.label().to_string());
            run.ideas_count = ideas_count;
            run.completed_at = Some(now());
        })
    }

    async fn mark_failed(&self, run_id: Uuid, error_message: &str) -> Result<()> {
        self.update_run(run_id, |run| {
            run.status = RunStatus::Failed;
            run.error_message = Some(error_message.to_string());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConfidenceLevel;

    fn draft(title: &str) -> IdeaDraft {
        IdeaDraft {
            title: title.to_string(),
            pain_description: "боль".to_string(),
            segment: "сегмент".to_string(),
            confidence_level: ConfidenceLevel::Medium,
            brief_evidence: "кратко".to_string(),
            detailed_evidence: None,
            plan_7days: "план".to_string(),
            plan_30days: "план".to_string(),
            analogues: vec![],
            evidence: vec![],
        }
    }

    #[tokio::test]
    async fn lifecycle_transitions_recorded() {
        let store = MemoryRunStore::new();
        let run_id = store.insert_run(Some("B2B SaaS"));

        store.mark_running(run_id, Stage::SignalSearch).await.unwrap();
        store.set_selected_direction(run_id, "B2B SaaS").await.unwrap();
        store.set_stage(run_id, Stage::Saving).await.unwrap();
        store.mark_completed(run_id, 5).await.unwrap();

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.current_stage.as_deref(), Some("Завершено"));
        assert_eq!(run.ideas_count, 5);
        assert!(run.completed_at.is_some());
    }

    #[tokio::test]
    async fn failure_keeps_inserted_ideas() {
        let store = MemoryRunStore::new();
        let run_id = store.insert_run(None);

        store.insert_idea(run_id, 0, &draft("a")).await.unwrap();
        store.insert_idea(run_id, 1, &draft("b")).await.unwrap();
        store.mark_failed(run_id, "Ошибка генерации: сбой").await.unwrap();

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.completed_at.is_none());
        assert_eq!(store.ideas_for_run(run_id).len(), 2);
    }

    #[tokio::test]
    async fn unknown_run_errors() {
        let store = MemoryRunStore::new();
        let missing = Uuid::new_v4();
        assert!(store.load_run(missing).await.unwrap().is_none());
        assert!(store.mark_running(missing, Stage::SignalSearch).await.is_err());
    }

    #[tokio::test]
    async fn idea_ids_are_sequential() {
        let store = MemoryRunStore::new();
        let run_id = store.insert_run(None);
        let first = store.insert_idea(run_id, 0, &draft("a")).await.unwrap();
        let second = store.insert_idea(run_id, 1, &draft("b")).await.unwrap();
        assert_eq!(second, first + 1);
    }
}
