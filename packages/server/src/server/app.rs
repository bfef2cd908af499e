//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::jobs::PostgresJobQueue;
use crate::server::middleware::capture_client_meta;
use crate::server::routes::{
    admin_purchases_handler, create_purchase_handler, create_run_handler, get_idea_handler,
    get_run_handler, health_handler, run_ideas_handler, stream_logs, stream_progress,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub db_pool: PgPool,
    pub queue: PostgresJobQueue,
    pub config: Arc<Config>,
}

/// Build the Axum application router
pub fn build_app(pool: PgPool, config: Arc<Config>) -> Router {
    let app_state = AxumAppState {
        db_pool: pool.clone(),
        queue: PostgresJobQueue::new(pool),
        config: config.clone(),
    };

    // CORS configuration - allow any origin, the frontend runs on its own host
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    // Rate limiting for run creation: N runs per hour per IP. The governor
    // replenishes one cell per period, so the hourly budget becomes the burst.
    let runs_per_hour = config.rate_limit_runs_per_hour.max(1);
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .period(Duration::from_secs(
                (3600 / u64::from(runs_per_hour)).max(1),
            ))
            .burst_size(runs_per_hour)
            .use_headers() // Extract IP from X-Forwarded-For header
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );

    let rate_limited = Router::new()
        .route("/api/runs", post(create_run_handler))
        .layer(GovernorLayer {
            config: rate_limit_config,
        });

    Router::new()
        .merge(rate_limited)
        .route("/api/runs/:run_id", get(get_run_handler))
        .route("/api/runs/:run_id/progress", get(stream_progress))
        .route("/api/runs/:run_id/logs", get(stream_logs))
        .route("/api/runs/:run_id/ideas", get(run_ideas_handler))
        .route("/api/ideas/:idea_id", get(get_idea_handler))
        .route("/api/purchases", post(create_purchase_handler))
        .route("/api/admin/purchases", get(admin_purchases_handler))
        // Health check (no rate limit)
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(capture_client_meta))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
