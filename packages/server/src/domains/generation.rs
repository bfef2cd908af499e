//! The generation job handler: glues the job queue to the ideation pipeline.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use ideation::stores::PostgresRunStore;
use ideation::{
    GenerationPipeline, NoopWebSearcher, OpenRouterGenerator, RunStore, TavilySearcher,
    WebSearcher,
};
use openrouter_client::OpenRouterClient;
use serde::Deserialize;
use sqlx::postgres::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::kernel::jobs::{JobHandler, JOB_TYPE_GENERATION};

/// Arguments carried by a generation job.
#[derive(Debug, Deserialize)]
struct GenerationJobArgs {
    run_id: Uuid,
}

/// App attribution headers OpenRouter asks providers to send.
const OPENROUTER_REFERER: &str = "https://pain-to-idea-generator.app";
const OPENROUTER_APP_TITLE: &str = "Pain-to-Idea Generator";

/// Executes one generation run per job.
pub struct GenerationJobHandler {
    pipeline: GenerationPipeline,
    store: Arc<dyn RunStore>,
}

impl GenerationJobHandler {
    pub fn new(pipeline: GenerationPipeline, store: Arc<dyn RunStore>) -> Self {
        Self { pipeline, store }
    }

    /// Build the pipeline from application configuration.
    pub fn from_config(pool: PgPool, config: &Config) -> Result<Self> {
        let mut client = OpenRouterClient::new(config.openrouter_api_key.clone())
            .with_referer(OPENROUTER_REFERER)
            .with_title(OPENROUTER_APP_TITLE);
        if let Some(base_url) = &config.openrouter_base_url {
            client = client.with_base_url(base_url.clone());
        }
        let generator = OpenRouterGenerator::new(client, config.openrouter_model.clone());
        info!(model = generator.model(), "text generator ready");

        let searcher: Arc<dyn WebSearcher> = match &config.tavily_api_key {
            Some(api_key) => Arc::new(
                TavilySearcher::new(api_key.clone())
                    .map_err(|e| anyhow!(e.to_string()))
                    .context("failed to create Tavily searcher")?,
            ),
            None => {
                warn!("TAVILY_API_KEY not set, runs will use the ungrounded fallback");
                Arc::new(NoopWebSearcher)
            }
        };

        let store: Arc<dyn RunStore> = Arc::new(PostgresRunStore::from_pool(pool));
        let pipeline = GenerationPipeline::new(store.clone(), Arc::new(generator), searcher);

        Ok(Self::new(pipeline, store))
    }
}

#[async_trait::async_trait]
impl JobHandler for GenerationJobHandler {
    fn job_type(&self) -> &'static str {
        JOB_TYPE_GENERATION
    }

    async fn execute(&self, args: serde_json::Value) -> Result<()> {
        let args: GenerationJobArgs =
            serde_json::from_value(args).context("invalid generation job args")?;

        // The pipeline records run-level failure itself; the returned error
        // only drives job bookkeeping.
        self.pipeline
            .execute(args.run_id)
            .await
            .map_err(|e| anyhow!(e.to_string()))?;
        Ok(())
    }

    /// The worker dropped the pipeline future, so the pipeline's own failure
    /// path never ran; the run must still reach a terminal state.
    async fn on_timeout(&self, args: serde_json::Value) {
        let Ok(args) = serde_json::from_value::<GenerationJobArgs>(args) else {
            return;
        };

        warn!(run_id = %args.run_id, "generation timed out, failing the run");
        if let Err(e) = self
            .store
            .mark_failed(args.run_id, "Превышено время ожидания")
            .await
        {
            error!(run_id = %args.run_id, error = %e, "failed to record run timeout");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::jobs::JobHandler;
    use ideation::testing::{MockTextGenerator, MockWebSearcher};
    use ideation::{MemoryRunStore, RunStatus};

    fn handler_with_store() -> (GenerationJobHandler, Arc<MemoryRunStore>) {
        let store = Arc::new(MemoryRunStore::new());
        let pipeline = GenerationPipeline::new(
            store.clone(),
            Arc::new(MockTextGenerator::new()),
            Arc::new(MockWebSearcher::empty()),
        );
        (GenerationJobHandler::new(pipeline, store.clone()), store)
    }

    #[tokio::test]
    async fn timeout_fails_the_run_with_a_readable_message() {
        let (handler, store) = handler_with_store();
        let run_id = store.insert_run(Some("B2B SaaS"));

        handler
            .on_timeout(serde_json::json!({ "run_id": run_id }))
            .await;

        let run = store.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error_message.as_deref(), Some("Превышено время ожидания"));
    }

    #[tokio::test]
    async fn timeout_with_malformed_args_is_a_no_op() {
        let (handler, store) = handler_with_store();
        let run_id = store.insert_run(None);

        handler.on_timeout(serde_json::json!({ "nope": true })).await;

        assert_eq!(store.get_run(run_id).unwrap().status, RunStatus::Pending);
    }
}
