//! Fixed configuration constants for the generation pipeline.
//!
//! These are deliberately not user-tunable per request: temperature and
//! token budgets are quality knobs owned by the operator, not the caller.

/// Tunable constants for one pipeline run.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Sampling temperature for the idea generation call
    pub generate_temperature: f32,
    /// Token budget for the idea generation call
    pub generate_max_tokens: u32,
    /// Sampling temperature for pain extraction (low for consistency)
    pub extract_temperature: f32,
    /// Token budget for each pain extraction call
    pub extract_max_tokens: u32,
    /// Documents per extraction batch (respects generation token limits)
    pub extract_batch_size: usize,
    /// At most this many idea objects are taken from the generation output
    pub max_ideas: usize,
    /// Quality floor: fewer accepted ideas than this fails the run
    pub min_ideas: usize,
    /// Quality gate: fewer extracted pains than this falls back to the
    /// ungrounded prompt instead of pretending the evidence is solid
    pub min_grounded_pains: usize,
    /// Analogues persisted per idea
    pub max_analogues: usize,
    /// Requested results per search query
    pub search_max_results: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            generate_temperature: 0.7,
            generate_max_tokens: 8000,
            extract_temperature: 0.3,
            extract_max_tokens: 4000,
            extract_batch_size: 15,
            max_ideas: 15,
            min_ideas: 3,
            min_grounded_pains: 3,
            max_analogues: 3,
            search_max_results: 10,
        }
    }
}

impl GenerationConfig {
    /// Override the quality floor (minimum accepted ideas).
    pub fn with_min_ideas(mut self, min_ideas: usize) -> Self {
        self.min_ideas = min_ideas;
        self
    }
}
