// Main entry point for the generation worker

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use server_core::domains::generation::GenerationJobHandler;
use server_core::kernel::jobs::{JobWorker, JobWorkerConfig, PostgresJobQueue};
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,ideation=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Idea Generator worker");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Migrations run here too so the worker can start on a fresh database
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let handler = GenerationJobHandler::from_config(pool.clone(), &config)
        .context("Failed to build generation pipeline")?;

    let queue = PostgresJobQueue::new(pool);
    let worker_config =
        JobWorkerConfig::with_job_timeout(Duration::from_secs(config.generation_timeout_seconds));

    let worker = JobWorker::new(queue, worker_config).register(Arc::new(handler));

    // Shut down cleanly on Ctrl-C; the current job finishes or times out
    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown_signal.cancel();
        }
    });

    worker.run(shutdown).await?;

    tracing::info!("Worker stopped");
    Ok(())
}
