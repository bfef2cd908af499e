//! OpenRouter implementation of the text generation trait.
//!
//! A thin adapter over the pure `openrouter-client` crate: maps the
//! pipeline's [`GenerationRequest`] onto a chat completion and provider
//! errors onto [`crate::GenerationError::Generation`].

use async_trait::async_trait;
use openrouter_client::{ChatRequest, OpenRouterClient};
use tracing::debug;

use crate::error::{GenerationError, Result};
use crate::traits::{GenerationRequest, TextGenerator};

/// OpenRouter-backed text generator pinned to one model.
#[derive(Clone)]
pub struct OpenRouterGenerator {
    client: OpenRouterClient,
    model: String,
}

impl OpenRouterGenerator {
    pub fn new(client: OpenRouterClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// The model name requests are pinned to.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenRouterGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let mut chat = ChatRequest::new(&self.model, request.prompt)
            .with_temperature(request.temperature)
            .with_max_tokens(request.max_tokens);

        if let Some(system_prompt) = request.system_prompt {
            chat = chat.with_system(system_prompt);
        }

        let response = self
            .client
            .chat_completion(chat)
            .await
            .map_err(GenerationError::generation)?;

        debug!(
            model = %self.model,
            content_len = response.content.len(),
            "text generation done"
        );

        Ok(response.content)
    }
}
