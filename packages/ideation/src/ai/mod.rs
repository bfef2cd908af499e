//! AI provider implementations.

#[cfg(feature = "openrouter")]
pub mod openrouter;

#[cfg(feature = "openrouter")]
pub use openrouter::OpenRouterGenerator;
