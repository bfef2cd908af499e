//! Text generation trait.
//!
//! Abstracts the LLM provider behind a single operation: given a prompt and
//! optional system instruction, return generated text. The pipeline fires at
//! most one call per stage and never retries; transient provider failures
//! surface as [`crate::GenerationError::Generation`].

use async_trait::async_trait;

use crate::error::Result;

/// One text generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Create a request with explicit sampling parameters.
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            temperature,
            max_tokens,
        }
    }

    /// Attach a system instruction.
    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Text generation seam.
///
/// Implementations wrap specific providers (OpenRouter here; anything that
/// turns a prompt into text will do) and handle transport specifics.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for the request; may fail transiently.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}
