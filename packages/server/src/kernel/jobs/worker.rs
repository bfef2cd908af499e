//! Job worker service for processing background jobs.
//!
//! The worker polls the queue, dispatches each claimed job to the handler
//! registered for its `job_type`, and records the outcome. Each job runs
//! under a hard timeout; cancellation is cooperative via the shutdown token.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::queue::{ClaimedJob, PostgresJobQueue};

/// Handler for one job type.
#[async_trait::async_trait]
pub trait JobHandler: Send + Sync {
    /// The `job_type` value this handler accepts.
    fn job_type(&self) -> &'static str;

    /// Execute one job with its deserialized arguments.
    async fn execute(&self, args: serde_json::Value) -> Result<()>;

    /// Called after `execute` was cancelled by the per-job timeout.
    ///
    /// The execute future was dropped mid-flight, so any terminal
    /// bookkeeping the handler normally does on failure must happen here
    /// instead. Default: nothing.
    async fn on_timeout(&self, _args: serde_json::Value) {}
}

/// Configuration for the job worker.
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    /// How long to wait when no jobs are available
    pub poll_interval: Duration,
    /// Hard per-job execution timeout
    pub job_timeout: Duration,
    /// Worker ID for this instance
    pub worker_id: String,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            job_timeout: Duration::from_secs(600),
            worker_id: format!("worker-{}", Uuid::new_v4()),
        }
    }
}

impl JobWorkerConfig {
    /// Create a config with a specific per-job timeout.
    pub fn with_job_timeout(timeout: Duration) -> Self {
        Self {
            job_timeout: timeout,
            ..Default::default()
        }
    }
}

/// A job worker that processes jobs from the queue, one at a time.
///
/// Generation jobs are long and LLM-bound; single-job processing keeps one
/// worker from holding several expensive pipelines at once. Scale by
/// running more worker processes.
pub struct JobWorker {
    queue: PostgresJobQueue,
    handlers: HashMap<&'static str, Arc<dyn JobHandler>>,
    config: JobWorkerConfig,
}

impl JobWorker {
    pub fn new(queue: PostgresJobQueue, config: JobWorkerConfig) -> Self {
        Self {
            queue,
            handlers: HashMap::new(),
            config,
        }
    }

    /// Register a handler for its job type.
    pub fn register(mut self, handler: Arc<dyn JobHandler>) -> Self {
        self.handlers.insert(handler.job_type(), handler);
        self
    }

    /// Run until the shutdown token fires.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        info!(
            worker_id = %self.config.worker_id,
            job_types = ?self.handlers.keys().collect::<Vec<_>>(),
            "job worker starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let job = match self.queue.claim_one(&self.config.worker_id).await {
                Ok(job) => job,
                Err(e) => {
                    error!(error = %e, "failed to claim job");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
            };

            let Some(job) = job else {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                }
                continue;
            };

            self.process_job(job).await;
        }

        info!(worker_id = %self.config.worker_id, "job worker stopped");
        Ok(())
    }

    async fn process_job(&self, job: ClaimedJob) {
        let job_id = job.id;
        let job_type = job.job_type.clone();
        debug!(job_id = %job_id, job_type = %job_type, "processing job");

        let result = match self.handlers.get(job_type.as_str()) {
            Some(handler) => {
                dispatch_with_timeout(handler.as_ref(), job.args.clone(), self.config.job_timeout)
                    .await
            }
            None => Err(anyhow!("unknown job type: {}", job_type)),
        };

        match result {
            Ok(()) => {
                debug!(job_id = %job_id, job_type = %job_type, "job succeeded");
                if let Err(e) = self.queue.mark_succeeded(job_id).await {
                    error!(job_id = %job_id, error = %e, "failed to mark job as succeeded");
                }
            }
            Err(e) => {
                warn!(job_id = %job_id, job_type = %job_type, error = %e, "job failed");
                if let Err(e) = self.queue.mark_failed(&job, &e.to_string()).await {
                    error!(job_id = %job_id, error = %e, "failed to mark job as failed");
                }
            }
        }
    }
}

/// Run a handler under the per-job timeout.
///
/// Timing out drops the execute future, so the handler's `on_timeout` hook
/// runs afterwards to settle whatever state the cancelled job left behind.
async fn dispatch_with_timeout(
    handler: &dyn JobHandler,
    args: serde_json::Value,
    timeout: Duration,
) -> Result<()> {
    match tokio::time::timeout(timeout, handler.execute(args.clone())).await {
        Ok(result) => result,
        Err(_) => {
            handler.on_timeout(args).await;
            Err(anyhow!("job timed out after {}s", timeout.as_secs()))
        }
    }
}
