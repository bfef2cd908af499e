//! PostgreSQL-backed job queue.
//!
//! Jobs are plain rows claimed with `FOR UPDATE SKIP LOCKED`, so any number
//! of workers can poll the same table without double-claiming.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

/// Job type for idea generation runs.
pub const JOB_TYPE_GENERATION: &str = "generation:run";

/// A claimed job ready for execution.
#[derive(Debug, Clone, FromRow)]
pub struct ClaimedJob {
    pub id: Uuid,
    pub job_type: String,
    pub args: serde_json::Value,
    pub retry_count: i32,
    pub max_retries: i32,
}

/// PostgreSQL-backed job queue.
#[derive(Clone)]
pub struct PostgresJobQueue {
    pool: PgPool,
}

impl PostgresJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue a job for immediate execution.
    ///
    /// `max_retries` of 0 means one attempt only; generation jobs use that
    /// because a failed run is terminal and visible to the user.
    pub async fn enqueue(
        &self,
        job_type: &str,
        args: serde_json::Value,
        max_retries: i32,
    ) -> Result<Uuid> {
        let job_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO jobs (job_type, args, max_retries)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(job_type)
        .bind(&args)
        .bind(max_retries)
        .fetch_one(&self.pool)
        .await?;

        info!(job_id = %job_id, job_type = %job_type, "job enqueued");
        Ok(job_id)
    }

    /// Claim the next ready job, if any.
    ///
    /// Uses `FOR UPDATE SKIP LOCKED` for concurrent-safe claiming.
    pub async fn claim_one(&self, worker_id: &str) -> Result<Option<ClaimedJob>> {
        let job = sqlx::query_as::<_, ClaimedJob>(
            r#"
            UPDATE jobs
            SET status = 'running',
                worker_id = $1,
                updated_at = NOW()
            WHERE id = (
                SELECT id FROM jobs
                WHERE status = 'pending' AND run_at <= NOW()
                ORDER BY created_at
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, job_type, args, retry_count, max_retries
            "#,
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    /// Mark a job as successfully completed.
    pub async fn mark_succeeded(&self, job_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE jobs SET status = 'succeeded', updated_at = NOW() WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark a job as failed.
    ///
    /// If retries remain the job is re-queued with exponential backoff,
    /// otherwise it goes to dead letter.
    pub async fn mark_failed(&self, job: &ClaimedJob, error: &str) -> Result<()> {
        if job.retry_count < job.max_retries {
            let delay_secs = 2i64.pow(job.retry_count as u32).min(3600);
            let retry_at: DateTime<Utc> = Utc::now() + chrono::Duration::seconds(delay_secs);

            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'pending',
                    retry_count = retry_count + 1,
                    error_message = $2,
                    run_at = $3,
                    worker_id = NULL,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(job.id)
            .bind(error)
            .bind(retry_at)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query(
                r#"
                UPDATE jobs
                SET status = 'dead_letter',
                    error_message = $2,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(job.id)
            .bind(error)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }
}
