//! Evidence-Grounded Business Idea Generation Library
//!
//! Turns a business direction into a set of validated business ideas by
//! searching real user discussions for pains, extracting them with an LLM,
//! and generating ideas grounded in that evidence.
//!
//! # Design Philosophy
//!
//! - Evidence first: ideas are conditioned on real extracted pains whenever
//!   the search yields enough signal
//! - Graceful degradation: a dead search provider or a bad extraction batch
//!   narrows the evidence, it never fails the run
//! - Strict output gate: the model's JSON is validated idea-by-idea and a
//!   run with too few surviving ideas fails loudly
//! - Library handles the pipeline, the app handles HTTP and job scheduling
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ideation::{GenerationPipeline, MemoryRunStore};
//! use ideation::testing::{MockTextGenerator, MockWebSearcher};
//!
//! let store = Arc::new(MemoryRunStore::new());
//! let run_id = store.insert_run(Some("B2B SaaS для малого бизнеса"));
//!
//! let pipeline = GenerationPipeline::new(
//!     store.clone(),
//!     Arc::new(MockTextGenerator::new()),
//!     Arc::new(MockWebSearcher::empty()),
//! );
//! let saved = pipeline.execute(run_id).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (TextGenerator, WebSearcher, RunStore)
//! - [`types`] - Run lifecycle and pipeline data types
//! - [`pipeline`] - Search, extraction, generation, and orchestration
//! - [`prompts`] - Prompt construction
//! - [`stores`] - Storage implementations (MemoryRunStore, PostgresRunStore)
//! - [`searchers`] - Search provider implementations (Tavily, no-op)
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod searchers;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use config::GenerationConfig;
pub use error::{GenerationError, Result};
pub use pipeline::{GenerationPipeline, PainExtractor, PainSearch};
pub use searchers::NoopWebSearcher;
pub use searchers::TavilySearcher;
pub use stores::MemoryRunStore;
pub use traits::{
    GenerationRequest, RunStore, SearchHit, SearchQuery, TextGenerator, WebSearcher,
};
pub use types::{
    progress_percent, AnalogueDraft, ConfidenceLevel, EvidenceDraft, ExtractedPain, IdeaDraft,
    PipelineRun, RunStatus, SourceDocument, Stage,
};

#[cfg(feature = "openrouter")]
pub use ai::OpenRouterGenerator;

#[cfg(feature = "postgres")]
pub use stores::PostgresRunStore;
