use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub openrouter_api_key: String,
    pub openrouter_base_url: Option<String>,
    pub openrouter_model: String,
    pub tavily_api_key: Option<String>,
    pub admin_api_key: String,
    pub rate_limit_runs_per_hour: u32,
    pub generation_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openrouter_api_key: env::var("OPENROUTER_API_KEY")
                .context("OPENROUTER_API_KEY must be set")?,
            openrouter_base_url: env::var("OPENROUTER_BASE_URL").ok(),
            openrouter_model: env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| "anthropic/claude-3.5-sonnet".to_string()),
            tavily_api_key: env::var("TAVILY_API_KEY").ok(),
            admin_api_key: env::var("ADMIN_API_KEY").context("ADMIN_API_KEY must be set")?,
            rate_limit_runs_per_hour: env::var("RATE_LIMIT_RUNS_PER_HOUR")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("RATE_LIMIT_RUNS_PER_HOUR must be a valid number")?,
            generation_timeout_seconds: env::var("GENERATION_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .context("GENERATION_TIMEOUT_SECONDS must be a valid number")?,
        })
    }
}
