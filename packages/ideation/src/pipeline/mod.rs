//! The generation pipeline and its stages.

pub mod extract;
pub mod parse;
pub mod run;
pub mod search;

pub use extract::{merge_similar_pains, PainExtractor};
pub use run::GenerationPipeline;
pub use search::PainSearch;
