//! Web search provider implementations.

pub mod noop;
pub mod tavily;

pub use noop::NoopWebSearcher;
pub use tavily::TavilySearcher;
