//! Idea generation backend: HTTP API, background worker, and storage.
//!
//! The API process accepts run requests and serves results; the worker
//! process claims queued generation jobs and drives the `ideation` pipeline.
//! Both share one PostgreSQL database.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::Config;
