//! Trait seams the pipeline depends on.
//!
//! Concrete providers (OpenRouter, Tavily, Postgres) are injected by the
//! application; tests substitute the mocks in [`crate::testing`] and the
//! in-memory store in [`crate::stores`].

pub mod ai;
pub mod searcher;
pub mod store;

pub use ai::{GenerationRequest, TextGenerator};
pub use searcher::{SearchHit, SearchQuery, WebSearcher};
pub use store::RunStore;
