//! Background job queue and worker.

pub mod queue;
pub mod worker;

pub use queue::{ClaimedJob, PostgresJobQueue, JOB_TYPE_GENERATION};
pub use worker::{JobHandler, JobWorker, JobWorkerConfig};
