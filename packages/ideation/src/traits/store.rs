//! Persistence seam the pipeline writes through.
//!
//! Every stage boundary is committed durably before the next external call,
//! so a crash mid-pipeline leaves an observable partial stage rather than
//! silent loss. Readers (the API's pollers) always re-read storage; nothing
//! is cached in-process.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{IdeaDraft, PipelineRun, Stage};

/// Storage operations the generation pipeline needs.
///
/// A run is only ever mutated by the one worker executing its job
/// (single-writer-per-run is operational, not enforced).
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Load the pipeline-relevant slice of a run, or `None` if unknown.
    async fn load_run(&self, run_id: Uuid) -> Result<Option<PipelineRun>>;

    /// Transition `pending → running` and set the initial stage.
    async fn mark_running(&self, run_id: Uuid, stage: Stage) -> Result<()>;

    /// Advance the progress stage (durable before the next external call).
    async fn set_stage(&self, run_id: Uuid, stage: Stage) -> Result<()>;

    /// Persist the resolved direction (set once, at stage start).
    async fn set_selected_direction(&self, run_id: Uuid, direction: &str) -> Result<()>;

    /// Persist one accepted idea with its analogues and evidence records.
    /// Returns the new idea's identifier.
    async fn insert_idea(&self, run_id: Uuid, order_index: i32, idea: &IdeaDraft) -> Result<i64>;

    /// Terminal success: status `completed`, stage "Завершено",
    /// `completed_at` set, `ideas_count` recorded.
    async fn mark_completed(&self, run_id: Uuid, ideas_count: i32) -> Result<()>;

    /// Terminal failure: status `failed` with a human-readable message.
    /// Ideas persisted before the failure are retained.
    async fn mark_failed(&self, run_id: Uuid, error_message: &str) -> Result<()>;
}
