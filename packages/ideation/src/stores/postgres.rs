//! PostgreSQL run storage.
//!
//! Writes through to the application's `runs` / `ideas` / `analogues` /
//! `evidences` tables. The schema is owned by the server's migrations;
//! this store only assumes the columns it touches.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::error::{GenerationError, Result};
use crate::traits::RunStore;
use crate::types::{IdeaDraft, PipelineRun, RunStatus, Stage};

/// PostgreSQL-backed run store.
pub struct PostgresRunStore {
    pool: PgPool,
}

impl PostgresRunStore {
    /// Create a store from an existing connection pool.
    ///
    /// Use this when the application already has a `PgPool` (the server
    /// does); it avoids duplicate connections.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_err(e: sqlx::Error) -> GenerationError {
    GenerationError::store(e)
}

#[async_trait]
impl RunStore for PostgresRunStore {
    async fn load_run(&self, run_id: Uuid) -> Result<Option<PipelineRun>> {
        let row = sqlx::query(
            "SELECT id, status, optional_direction FROM runs WHERE id = $1",
        )
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        let Some(row) = row else { return Ok(None) };

        let status: String = row.get("status");
        let status = status
            .parse::<RunStatus>()
            .map_err(|e| GenerationError::store(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        Ok(Some(PipelineRun {
            id: row.get("id"),
            status,
            optional_direction: row.get("optional_direction"),
        }))
    }

    async fn mark_running(&self, run_id: Uuid, stage: Stage) -> Result<()> {
        sqlx::query(
            "UPDATE runs SET status = 'running', current_stage = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(run_id)
        .bind(stage.label())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn set_stage(&self, run_id: Uuid, stage: Stage) -> Result<()> {
        sqlx::query("UPDATE runs SET current_stage = $2, updated_at = NOW() WHERE id = $1")
            .bind(run_id)
            .bind(stage.label())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn set_selected_direction(&self, run_id: Uuid, direction: &str) -> Result<()> {
        sqlx::query("UPDATE runs SET selected_direction = $2, updated_at = NOW() WHERE id = $1")
            .bind(run_id)
            .bind(direction)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn insert_idea(&self, run_id: Uuid, order_index: i32, idea: &IdeaDraft) -> Result<i64> {
        // One transaction per idea: an idea is either fully present with its
        // analogues and evidence, or absent.
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        let idea_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO ideas (
                run_id, order_index, title, pain_description, segment,
                confidence_level, brief_evidence, detailed_evidence,
                plan_7days, plan_30days
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(run_id)
        .bind(order_index)
        .bind(&idea.title)
        .bind(&idea.pain_description)
        .bind(&idea.segment)
        .bind(idea.confidence_level.to_string())
        .bind(&idea.brief_evidence)
        .bind(&idea.detailed_evidence)
        .bind(&idea.plan_7days)
        .bind(&idea.plan_30days)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_err)?;

        for (analogue_index, analogue) in idea.analogues.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO analogues (idea_id, order_index, name, description, url)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(idea_id)
            .bind(analogue_index as i32)
            .bind(&analogue.name)
            .bind(&analogue.description)
            .bind(&analogue.url)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        }

        for evidence in &idea.evidence {
            sqlx::query(
                r#"
                INSERT INTO evidences (idea_id, pattern_description, source_type, source_url, example_quote)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(idea_id)
            .bind(&evidence.pattern_description)
            .bind(&evidence.source_type)
            .bind(&evidence.source_url)
            .bind(&evidence.example_quote)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(idea_id)
    }

    async fn mark_completed(&self, run_id: Uuid, ideas_count: i32) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE runs
            SET status = 'completed',
                current_stage = $2,
                ideas_count = $3,
                completed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .bind(Stage::Finished.label())
        .bind(ideas_count)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn mark_failed(&self, run_id: Uuid, error_message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE runs SET status = 'failed', error_message = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(run_id)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }
}
