//! Pure OpenRouter REST API client
//!
//! A clean, minimal client for the OpenRouter chat completions API with no
//! domain-specific logic.
//!
//! # Example
//!
//! ```rust,ignore
//! use openrouter_client::{ChatRequest, OpenRouterClient};
//!
//! let client = OpenRouterClient::from_env()?;
//!
//! let response = client
//!     .chat_completion(
//!         ChatRequest::new("anthropic/claude-3.5-sonnet", "Hello!")
//!             .with_temperature(0.7)
//!             .with_max_tokens(4000),
//!     )
//!     .await?;
//! println!("{}", response.content);
//! ```

pub mod error;
pub mod types;

pub use error::{OpenRouterError, Result};
pub use types::*;

use reqwest::Client;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Pure OpenRouter API client.
#[derive(Clone)]
pub struct OpenRouterClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    referer: Option<String>,
    title: Option<String>,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            referer: None,
            title: None,
        }
    }

    /// Create from environment variable `OPENROUTER_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| OpenRouterError::Config("OPENROUTER_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies or self-hosted gateways).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the optional `HTTP-Referer` header OpenRouter uses for attribution.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Set the optional `X-Title` header OpenRouter uses for attribution.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Send messages to the chat completions API and get a response.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        debug!(
            model = %request.model,
            temperature = ?request.temperature,
            max_tokens = ?request.max_tokens,
            messages = request.messages.len(),
            "OpenRouter chat completion request"
        );

        let mut builder = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");

        if let Some(referer) = &self.referer {
            builder = builder.header("HTTP-Referer", referer.clone());
        }
        if let Some(title) = &self.title {
            builder = builder.header("X-Title", title.clone());
        }

        let response = builder.json(&request).send().await.map_err(|e| {
            warn!(error = %e, "OpenRouter request failed");
            OpenRouterError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenRouter API error");
            return Err(OpenRouterError::Api(format!("{}: {}", status, error_text)));
        }

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenRouterError::Parse(e.to_string()))?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| OpenRouterError::Api("No response from OpenRouter".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            content_len = content.len(),
            usage = ?raw.usage,
            "OpenRouter chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: raw.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_base_url() {
        let client = OpenRouterClient::new("key").with_base_url("http://localhost:9999/v1");
        assert_eq!(client.base_url(), "http://localhost:9999/v1");
    }

    #[test]
    fn default_base_url_points_at_openrouter() {
        let client = OpenRouterClient::new("key");
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }
}
