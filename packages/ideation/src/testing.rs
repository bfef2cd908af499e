//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the ideation library
//! without making real AI or network calls.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{GenerationError, Result};
use crate::traits::{GenerationRequest, SearchHit, SearchQuery, TextGenerator, WebSearcher};

/// A scripted text generator for testing.
///
/// Responses are consumed in FIFO order, one per `generate` call; an empty
/// script yields a generation error. Every request is recorded for
/// assertions.
#[derive(Default)]
pub struct MockTextGenerator {
    script: Arc<RwLock<VecDeque<std::result::Result<String, String>>>>,
    requests: Arc<RwLock<Vec<GenerationRequest>>>,
}

impl MockTextGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn push_response(&self, response: impl Into<String>) {
        self.script.write().unwrap().push_back(Ok(response.into()));
    }

    /// Queue a failing call.
    pub fn push_error(&self, message: impl Into<String>) {
        self.script.write().unwrap().push_back(Err(message.into()));
    }

    /// All requests made so far.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        self.requests.write().unwrap().push(request);

        match self.script.write().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(GenerationError::generation(std::io::Error::new(
                std::io::ErrorKind::Other,
                message,
            ))),
            None => Err(GenerationError::generation(std::io::Error::new(
                std::io::ErrorKind::Other,
                "mock script exhausted",
            ))),
        }
    }
}

/// A mock web searcher for testing.
///
/// Returns the same predefined hit list for every query, or fails every
/// query when constructed with `failing`.
#[derive(Default)]
pub struct MockWebSearcher {
    hits: Vec<SearchHit>,
    fail: bool,
    queries: Arc<RwLock<Vec<SearchQuery>>>,
}

impl MockWebSearcher {
    /// Answer every query with the given hits.
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Default::default()
        }
    }

    /// Answer every query with an empty hit list.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fail every query.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// All queries made so far.
    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        self.queries.write().unwrap().push(query.clone());

        if self.fail {
            return Err(GenerationError::search(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock connection refused",
            )));
        }
        Ok(self.hits.clone())
    }
}
