//! Typed errors for the generation pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! User-visible messages (`ResponseParse`, `TooFewIdeas`) keep the wording
//! of the product: they end up verbatim in a run's `error_message`.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while generating ideas for a run.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The run does not exist
    #[error("run not found: {run_id}")]
    RunNotFound { run_id: Uuid },

    /// The run is not in the `pending` state (transitions are one-directional)
    #[error("run {run_id} is not pending (status: {status})")]
    InvalidState { run_id: Uuid, status: String },

    /// Web search provider unreachable or rejecting
    #[error("search error: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Text generation provider unreachable or rejecting
    #[error("Ошибка генерации: {0}")]
    Generation(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Generation output was not the expected JSON shape (fatal, never retried)
    #[error("Ошибка парсинга ответа LLM: {0}")]
    ResponseParse(String),

    /// Fewer ideas survived validation than the configured quality floor
    #[error("Недостаточно идей сгенерировано: {saved} (требуется минимум {required})")]
    TooFewIdeas { saved: usize, required: usize },

    /// Storage operation failed
    #[error("storage error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GenerationError {
    /// Wrap a provider error as a search failure.
    pub fn search(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Search(Box::new(err))
    }

    /// Wrap a provider error as a generation failure.
    pub fn generation(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Generation(Box::new(err))
    }

    /// Wrap a storage error.
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(err))
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;
