//! Idea records and their client-facing views.

use anyhow::Result;
use serde::Serialize;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use uuid::Uuid;

const BRIEF_PAIN_CHARS: usize = 200;

/// An idea row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct Idea {
    pub id: i64,
    pub run_id: Uuid,
    pub order_index: i32,
    pub title: String,
    pub pain_description: String,
    pub segment: String,
    pub confidence_level: String,
    pub brief_evidence: String,
    pub detailed_evidence: Option<String>,
    pub plan_7days: String,
    pub plan_30days: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Analogue {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Evidence {
    pub id: i64,
    pub pattern_description: String,
    pub source_type: String,
    pub source_url: Option<String>,
    pub example_quote: Option<String>,
}

/// Compact view for a run's idea list.
#[derive(Debug, Serialize)]
pub struct IdeaBrief {
    pub id: i64,
    pub title: String,
    pub pain_description: String,
    pub segment: String,
    pub confidence_level: String,
    pub brief_evidence: String,
}

/// Full view for the idea detail endpoint.
#[derive(Debug, Serialize)]
pub struct IdeaFull {
    pub id: i64,
    pub title: String,
    pub pain_description: String,
    pub segment: String,
    pub confidence_level: String,
    pub brief_evidence: String,
    pub detailed_evidence: Option<String>,
    pub analogues: Vec<Analogue>,
    pub evidence: Vec<Evidence>,
    pub plan_7days: String,
    pub plan_30days: String,
}

impl Idea {
    /// Brief view: pain description cut to 200 characters with an ellipsis.
    pub fn brief(&self) -> IdeaBrief {
        let pain_description = if self.pain_description.chars().count() > BRIEF_PAIN_CHARS {
            let cut: String = self.pain_description.chars().take(BRIEF_PAIN_CHARS).collect();
            format!("{}...", cut)
        } else {
            self.pain_description.clone()
        };

        IdeaBrief {
            id: self.id,
            title: self.title.clone(),
            pain_description,
            segment: self.segment.clone(),
            confidence_level: self.confidence_level.clone(),
            brief_evidence: self.brief_evidence.clone(),
        }
    }
}

/// All ideas for a run, in generation order.
pub async fn ideas_for_run(pool: &PgPool, run_id: Uuid) -> Result<Vec<Idea>> {
    let ideas = sqlx::query_as::<_, Idea>(
        r#"
        SELECT id, run_id, order_index, title, pain_description, segment,
               confidence_level, brief_evidence, detailed_evidence,
               plan_7days, plan_30days
        FROM ideas
        WHERE run_id = $1
        ORDER BY order_index
        "#,
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(ideas)
}

/// Full detail for one idea, with its analogues and evidence records.
pub async fn idea_detail(pool: &PgPool, idea_id: i64) -> Result<Option<IdeaFull>> {
    let idea = sqlx::query_as::<_, Idea>(
        r#"
        SELECT id, run_id, order_index, title, pain_description, segment,
               confidence_level, brief_evidence, detailed_evidence,
               plan_7days, plan_30days
        FROM ideas
        WHERE id = $1
        "#,
    )
    .bind(idea_id)
    .fetch_optional(pool)
    .await?;

    let Some(idea) = idea else { return Ok(None) };

    let analogues = sqlx::query_as::<_, Analogue>(
        r#"
        SELECT id, name, description, url
        FROM analogues
        WHERE idea_id = $1
        ORDER BY order_index
        "#,
    )
    .bind(idea_id)
    .fetch_all(pool)
    .await?;

    let evidence = sqlx::query_as::<_, Evidence>(
        r#"
        SELECT id, pattern_description, source_type, source_url, example_quote
        FROM evidences
        WHERE idea_id = $1
        ORDER BY id
        "#,
    )
    .bind(idea_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(IdeaFull {
        id: idea.id,
        title: idea.title,
        pain_description: idea.pain_description,
        segment: idea.segment,
        confidence_level: idea.confidence_level,
        brief_evidence: idea.brief_evidence,
        detailed_evidence: idea.detailed_evidence,
        analogues,
        evidence,
        plan_7days: idea.plan_7days,
        plan_30days: idea.plan_30days,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea(pain: &str) -> Idea {
        Idea {
            id: 1,
            run_id: Uuid::new_v4(),
            order_index: 0,
            title: "Идея".to_string(),
            pain_description: pain.to_string(),
            segment: "сегмент".to_string(),
            confidence_level: "high".to_string(),
            brief_evidence: "кратко".to_string(),
            detailed_evidence: None,
            plan_7days: "план".to_string(),
            plan_30days: "план".to_string(),
        }
    }

    #[test]
    fn long_pain_description_truncated_with_ellipsis() {
        let long: String = "б".repeat(250);
        let brief = idea(&long).brief();
        assert_eq!(brief.pain_description.chars().count(), 203);
        assert!(brief.pain_description.ends_with("..."));
    }

    #[test]
    fn short_pain_description_untouched() {
        let brief = idea("короткая боль").brief();
        assert_eq!(brief.pain_description, "короткая боль");
    }
}
