//! Run records: creation, lookup, and the client-facing snapshot.

use anyhow::Result;
use chrono::{DateTime, Utc};
use ideation::progress_percent;
use serde::Serialize;
use serde_json::json;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{error, info};
use uuid::Uuid;

use crate::kernel::jobs::{PostgresJobQueue, JOB_TYPE_GENERATION};

const MAX_DIRECTION_CHARS: usize = 500;

/// A run row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct Run {
    pub id: Uuid,
    pub status: String,
    pub current_stage: Option<String>,
    pub optional_direction: Option<String>,
    pub selected_direction: Option<String>,
    pub ideas_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Client-facing view of a run, used by the status endpoint and both
/// SSE streams.
#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub status: String,
    pub current_stage: Option<String>,
    pub progress_percent: u8,
    pub optional_direction: Option<String>,
    pub ideas_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Run {
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.id,
            status: self.status.clone(),
            current_stage: self.current_stage.clone(),
            progress_percent: progress_percent(self.current_stage.as_deref()),
            optional_direction: self.optional_direction.clone(),
            ideas_count: self.ideas_count,
            error_message: self.error_message.clone(),
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// Create a pending run and enqueue its generation job.
///
/// An enqueue failure does not bubble up: the run is created but marked
/// failed immediately, so the caller still gets a run id whose status
/// endpoint explains what happened.
pub async fn create_run(
    pool: &PgPool,
    queue: &PostgresJobQueue,
    optional_direction: Option<&str>,
) -> Result<Run> {
    let run_id = Uuid::new_v4();
    let direction: Option<String> = optional_direction
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| d.chars().take(MAX_DIRECTION_CHARS).collect());

    let run = sqlx::query_as::<_, Run>(
        r#"
        INSERT INTO runs (id, status, optional_direction)
        VALUES ($1, 'pending', $2)
        RETURNING id, status, current_stage, optional_direction, selected_direction,
                  ideas_count, error_message, created_at, completed_at
        "#,
    )
    .bind(run_id)
    .bind(&direction)
    .fetch_one(pool)
    .await?;

    info!(run_id = %run_id, "run created");

    // Generation jobs get no retries: a failed run is terminal
    if let Err(e) = queue
        .enqueue(JOB_TYPE_GENERATION, json!({ "run_id": run_id }), 0)
        .await
    {
        error!(run_id = %run_id, error = %e, "failed to enqueue generation job");
        let message = format!("Ошибка постановки задачи: {}", e);
        sqlx::query(
            "UPDATE runs SET status = 'failed', error_message = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(run_id)
        .bind(&message)
        .execute(pool)
        .await?;

        return get_run(pool, run_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("run {} vanished after creation", run_id));
    }

    Ok(run)
}

/// Fetch a run by id.
pub async fn get_run(pool: &PgPool, run_id: Uuid) -> Result<Option<Run>> {
    let run = sqlx::query_as::<_, Run>(
        r#"
        SELECT id, status, current_stage, optional_direction, selected_direction,
               ideas_count, error_message, created_at, completed_at
        FROM runs
        WHERE id = $1
        "#,
    )
    .bind(run_id)
    .fetch_optional(pool)
    .await?;

    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(status: &str, stage: Option<&str>) -> Run {
        Run {
            id: Uuid::new_v4(),
            status: status.to_string(),
            current_stage: stage.map(str::to_string),
            optional_direction: Some("B2B SaaS".to_string()),
            selected_direction: None,
            ideas_count: 0,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn snapshot_maps_stage_to_percent() {
        let snapshot = run("running", Some("Генерация идей")).snapshot();
        assert_eq!(snapshot.progress_percent, 60);
        assert_eq!(snapshot.status, "running");
    }

    #[test]
    fn snapshot_of_stageless_run_is_zero_percent() {
        let snapshot = run("pending", None).snapshot();
        assert_eq!(snapshot.progress_percent, 0);
    }

    #[test]
    fn snapshot_serializes_expected_fields() {
        let json = serde_json::to_value(run("pending", None).snapshot()).unwrap();
        assert!(json.get("run_id").is_some());
        assert!(json.get("progress_percent").is_some());
        assert!(json.get("ideas_count").is_some());
        assert!(json.get("selected_direction").is_none());
    }
}
