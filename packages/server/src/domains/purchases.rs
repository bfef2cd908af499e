//! Purchase records: intent clicks on ideas, plus admin statistics.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

const MAX_USER_AGENT_CHARS: usize = 500;

/// A recent purchase joined with its idea title.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PurchaseRecord {
    pub id: i64,
    pub idea_id: i64,
    pub idea_title: String,
    pub run_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub user_ip: Option<String>,
}

/// One row of the purchase leaderboard.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TopIdea {
    pub idea_id: i64,
    pub title: String,
    pub purchase_count: i64,
}

/// Admin statistics payload.
#[derive(Debug, Serialize)]
pub struct PurchaseStats {
    pub total_purchases: i64,
    pub recent_purchases: Vec<PurchaseRecord>,
    pub top_ideas: Vec<TopIdea>,
}

/// Storage operations the purchase flow needs.
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    /// The run an idea belongs to, or `None` when the idea is unknown.
    async fn idea_run(&self, idea_id: i64) -> Result<Option<Uuid>>;

    /// Insert a purchase row, returning its id.
    async fn insert_purchase(
        &self,
        idea_id: i64,
        run_id: Uuid,
        user_ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<i64>;
}

#[async_trait]
impl PurchaseStore for PgPool {
    async fn idea_run(&self, idea_id: i64) -> Result<Option<Uuid>> {
        let run_id = sqlx::query_scalar("SELECT run_id FROM ideas WHERE id = $1")
            .bind(idea_id)
            .fetch_optional(self)
            .await?;
        Ok(run_id)
    }

    async fn insert_purchase(
        &self,
        idea_id: i64,
        run_id: Uuid,
        user_ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<i64> {
        let purchase_id = sqlx::query_scalar(
            r#"
            INSERT INTO purchases (idea_id, run_id, user_ip, user_agent)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(idea_id)
        .bind(run_id)
        .bind(user_ip)
        .bind(user_agent)
        .fetch_one(self)
        .await?;
        Ok(purchase_id)
    }
}

/// Record a purchase click. Returns `None` when the idea does not exist.
pub async fn record_purchase<S: PurchaseStore + ?Sized>(
    store: &S,
    idea_id: i64,
    user_ip: Option<&str>,
    user_agent: Option<&str>,
) -> Result<Option<i64>> {
    let Some(run_id) = store.idea_run(idea_id).await? else {
        return Ok(None);
    };

    let user_agent: Option<String> =
        user_agent.map(|ua| ua.chars().take(MAX_USER_AGENT_CHARS).collect());

    let purchase_id = store
        .insert_purchase(idea_id, run_id, user_ip, user_agent.as_deref())
        .await?;

    info!(idea_id, user_ip = ?user_ip, "purchase recorded");
    Ok(Some(purchase_id))
}

/// Aggregate statistics for the admin endpoint.
pub async fn purchase_stats(pool: &PgPool) -> Result<PurchaseStats> {
    let total_purchases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases")
        .fetch_one(pool)
        .await?;

    let recent_purchases = sqlx::query_as::<_, PurchaseRecord>(
        r#"
        SELECT p.id, p.idea_id, i.title AS idea_title, p.run_id, p.created_at, p.user_ip
        FROM purchases p
        JOIN ideas i ON i.id = p.idea_id
        ORDER BY p.created_at DESC
        LIMIT 50
        "#,
    )
    .fetch_all(pool)
    .await?;

    let top_ideas = sqlx::query_as::<_, TopIdea>(
        r#"
        SELECT i.id AS idea_id, i.title, COUNT(p.id) AS purchase_count
        FROM ideas i
        JOIN purchases p ON p.idea_id = i.id
        GROUP BY i.id, i.title
        ORDER BY COUNT(p.id) DESC
        LIMIT 10
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(PurchaseStats {
        total_purchases,
        recent_purchases,
        top_ideas,
    })
}
