//! Storage implementations for the ideation library.
//!
//! Available backends:
//! - `MemoryRunStore` - In-memory storage (always available)
//! - `PostgresRunStore` - PostgreSQL storage (requires `postgres` feature)

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{MemoryRunStore, StoredIdea, StoredRun};

#[cfg(feature = "postgres")]
pub use postgres::PostgresRunStore;
