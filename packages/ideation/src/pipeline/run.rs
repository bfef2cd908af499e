//! Pipeline orchestrator: drives one run from `pending` to a terminal state.
//!
//! Stage order: signal search → pain analysis → idea generation → saving.
//! Each stage boundary is committed before the next external call. Search
//! and extraction failures degrade gracefully; a generation parse failure or
//! the minimum-count gate fails the run. No automatic retry happens here —
//! retry policy belongs to the job queue.

use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::error::{GenerationError, Result};
use crate::pipeline::extract::PainExtractor;
use crate::pipeline::parse;
use crate::pipeline::search::PainSearch;
use crate::prompts;
use crate::traits::{GenerationRequest, RunStore, TextGenerator, WebSearcher};
use crate::types::{RunStatus, Stage};

/// The idea generation pipeline with injected dependencies.
pub struct GenerationPipeline {
    store: Arc<dyn RunStore>,
    generator: Arc<dyn TextGenerator>,
    searcher: Arc<dyn WebSearcher>,
    config: GenerationConfig,
}

impl GenerationPipeline {
    pub fn new(
        store: Arc<dyn RunStore>,
        generator: Arc<dyn TextGenerator>,
        searcher: Arc<dyn WebSearcher>,
    ) -> Self {
        Self::with_config(store, generator, searcher, GenerationConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn RunStore>,
        generator: Arc<dyn TextGenerator>,
        searcher: Arc<dyn WebSearcher>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            store,
            generator,
            searcher,
            config,
        }
    }

    /// Execute the pipeline for one run.
    ///
    /// Returns the number of accepted ideas. Any fatal error is recorded
    /// into the run's `error_message` before propagating to the caller for
    /// job-queue-level visibility.
    pub async fn execute(&self, run_id: Uuid) -> Result<usize> {
        let run = self
            .store
            .load_run(run_id)
            .await?
            .ok_or(GenerationError::RunNotFound { run_id })?;

        // Transitions are one-directional; a non-pending run is never
        // re-entered and its state must not be damaged here.
        if run.status != RunStatus::Pending {
            return Err(GenerationError::InvalidState {
                run_id,
                status: run.status.to_string(),
            });
        }

        info!(run_id = %run_id, "starting generation pipeline");

        match self.run_stages(run_id, run.optional_direction.as_deref()).await {
            Ok(saved) => {
                info!(run_id = %run_id, ideas = saved, "run completed");
                Ok(saved)
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "generation pipeline failed");
                let message = user_facing_message(&e);
                if let Err(store_err) = self.store.mark_failed(run_id, &message).await {
                    error!(run_id = %run_id, error = %store_err, "failed to record run failure");
                }
                Err(e)
            }
        }
    }

    async fn run_stages(&self, run_id: Uuid, optional_direction: Option<&str>) -> Result<usize> {
        // Stage: signal search
        self.store.mark_running(run_id, Stage::SignalSearch).await?;

        let direction = prompts::resolve_direction(optional_direction, run_id);
        self.store.set_selected_direction(run_id, &direction).await?;
        info!(run_id = %run_id, direction = %direction, "direction resolved");

        let documents = PainSearch::new(self.searcher.clone(), self.config.clone())
            .search_pains(&direction)
            .await;

        // Stage: pain analysis
        self.store.set_stage(run_id, Stage::PainAnalysis).await?;

        let pains = if documents.is_empty() {
            Vec::new()
        } else {
            PainExtractor::new(self.generator.clone(), self.config.clone())
                .extract_pains(&documents, &direction)
                .await
        };

        // Stage: idea generation. Grounding gate: thin evidence must not be
        // presented to the generator as if it were solid.
        self.store.set_stage(run_id, Stage::IdeaGeneration).await?;

        let grounded = pains.len() >= self.config.min_grounded_pains;
        let prompt = if grounded {
            info!(run_id = %run_id, pains = pains.len(), "using grounded prompt");
            prompts::build_grounded_prompt(&direction, &pains)
        } else {
            info!(run_id = %run_id, pains = pains.len(), "too few pains, using fallback prompt");
            prompts::build_fallback_prompt(&direction)
        };

        let request = GenerationRequest::new(
            prompt,
            self.config.generate_temperature,
            self.config.generate_max_tokens,
        )
        .with_system(prompts::GENERATE_SYSTEM_PROMPT);

        let response = self.generator.generate(request).await?;
        let objects = parse::parse_object_array(&response, "ideas")?;

        // Stage: saving
        self.store.set_stage(run_id, Stage::Saving).await?;

        let mut saved = 0usize;
        for (idx, object) in objects.iter().take(self.config.max_ideas).enumerate() {
            match parse::normalize_idea(object, &self.config) {
                Some(draft) => {
                    self.store.insert_idea(run_id, idx as i32, &draft).await?;
                    saved += 1;
                }
                None => {
                    warn!(run_id = %run_id, index = idx, "skipping idea: missing required fields");
                }
            }
        }

        // Quality floor, not a transactional rollback: already-saved ideas
        // are retained on failure.
        if saved < self.config.min_ideas {
            return Err(GenerationError::TooFewIdeas {
                saved,
                required: self.config.min_ideas,
            });
        }

        self.store.mark_completed(run_id, saved as i32).await?;
        Ok(saved)
    }
}

/// Short human-readable message for `error_message`.
fn user_facing_message(error: &GenerationError) -> String {
    match error {
        // Display already carries the product prefix
        GenerationError::Generation(_) => error.to_string(),
        other => format!("Ошибка генерации: {}", other),
    }
}
