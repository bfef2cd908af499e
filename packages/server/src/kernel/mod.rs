//! Infrastructure shared by the API and the worker.

pub mod jobs;
