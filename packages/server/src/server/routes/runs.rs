//! Run endpoints: creation, status, ideas listing, and two polling SSE
//! streams (progress and logs).
//!
//! Both streams poll the database rather than subscribing to the worker:
//! the API and worker processes only share state through PostgreSQL.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Extension, Path},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::Utc;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::Instant;
use tracing::error;
use uuid::Uuid;

use crate::domains::runs;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

/// Both streams give up after ten minutes, matching the worker's job timeout.
const STREAM_MAX_DURATION: Duration = Duration::from_secs(600);
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_secs(5);
const LOGS_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Scripted log lines played to the client while a run is in flight. The
/// worker does not ship real-time logs; these keep the console moving.
const LOG_SCRIPT: [&str; 12] = [
    "Analyzing pain signals from public sources...",
    "Searching for user complaints and feedback...",
    "Identifying recurring pain patterns...",
    "Evaluating market segments...",
    "Generating business ideas...",
    "Brainstorming creative solutions...",
    "Searching for analogues and competitors...",
    "Analyzing successful implementations...",
    "Creating validation evidence...",
    "Drafting 7-day action plans...",
    "Drafting 30-day roadmaps...",
    "Finalizing idea descriptions...",
];

#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    pub optional_direction: Option<String>,
}

/// POST /api/runs
pub async fn create_run_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<CreateRunRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let run = runs::create_run(
        &state.db_pool,
        &state.queue,
        request.optional_direction.as_deref(),
    )
    .await
    .map_err(|e| {
        error!(error = %e, "failed to create run");
        ApiError::Server(format!("Ошибка создания прогона: {}", e))
    })?;

    Ok(Json(json!({
        "run_id": run.id,
        "status": run.status,
        "created_at": run.created_at,
    })))
}

/// GET /api/runs/:run_id
pub async fn get_run_handler(
    Extension(state): Extension<AxumAppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<runs::RunSnapshot>, ApiError> {
    let run = runs::get_run(&state.db_pool, run_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Прогон не найден".to_string()))?;

    Ok(Json(run.snapshot()))
}

/// GET /api/runs/:run_id/ideas
pub async fn run_ideas_handler(
    Extension(state): Extension<AxumAppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let run = runs::get_run(&state.db_pool, run_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Прогон не найден".to_string()))?;

    if run.status != "completed" {
        return Err(ApiError::BadRequest(format!(
            "Прогон еще не завершен. Текущий статус: {}",
            run.status
        )));
    }

    let ideas = crate::domains::ideas::ideas_for_run(&state.db_pool, run_id).await?;
    let briefs: Vec<_> = ideas.iter().map(|idea| idea.brief()).collect();

    Ok(Json(json!({
        "run_id": run_id,
        "ideas_count": briefs.len(),
        "selected_direction": run.selected_direction,
        "optional_direction": run.optional_direction,
        "ideas": briefs,
    })))
}

/// GET /api/runs/:run_id/progress
///
/// Named SSE events: `progress` while the run advances, then a terminal
/// `complete` or `error`. Each carries the run snapshot as JSON.
pub async fn stream_progress(
    Extension(state): Extension<AxumAppState>,
    Path(run_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let pool = state.db_pool.clone();

    let stream = async_stream::stream! {
        let started = Instant::now();

        loop {
            if started.elapsed() > STREAM_MAX_DURATION {
                yield Ok(named_event(
                    "error",
                    &json!({ "error_message": "Превышено время ожидания" }),
                ));
                break;
            }

            match runs::get_run(&pool, run_id).await {
                Ok(Some(run)) => {
                    let snapshot = run.snapshot();
                    match run.status.as_str() {
                        "completed" => {
                            yield Ok(named_event("complete", &snapshot));
                            break;
                        }
                        "failed" => {
                            yield Ok(named_event("error", &snapshot));
                            break;
                        }
                        _ => yield Ok(named_event("progress", &snapshot)),
                    }
                }
                Ok(None) => {
                    yield Ok(named_event(
                        "error",
                        &json!({ "error_message": "Прогон не найден" }),
                    ));
                    break;
                }
                Err(e) => {
                    error!(run_id = %run_id, error = %e, "progress stream query failed");
                    yield Ok(named_event(
                        "error",
                        &json!({ "error_message": "Внутренняя ошибка сервера" }),
                    ));
                    break;
                }
            }

            tokio::time::sleep(PROGRESS_POLL_INTERVAL).await;
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /api/runs/:run_id/logs
///
/// Data-only SSE stream for the live console. Plays a fixed script against
/// the run's actual status, with a `[DEBUG]` status line on every tick.
pub async fn stream_logs(
    Extension(state): Extension<AxumAppState>,
    Path(run_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let pool = state.db_pool.clone();
    let model = state.config.openrouter_model.clone();

    let stream = async_stream::stream! {
        let started = Instant::now();

        yield Ok(log_event(format!("Starting generation for run {}...", run_id), None));
        tokio::time::sleep(Duration::from_millis(500)).await;
        yield Ok(log_event("Connecting to OpenRouter API...", None));
        tokio::time::sleep(Duration::from_millis(500)).await;
        yield Ok(log_event(format!("Model: {}", model), None));
        tokio::time::sleep(Duration::from_millis(500)).await;
        yield Ok(log_event("Temperature: 0.7, Max tokens: 8000", None));
        tokio::time::sleep(Duration::from_secs(1)).await;

        let mut script = LOG_SCRIPT.iter();

        loop {
            if started.elapsed() > STREAM_MAX_DURATION {
                yield Ok(log_event("ERROR: Timeout exceeded", Some("error")));
                break;
            }

            let run = match runs::get_run(&pool, run_id).await {
                Ok(Some(run)) => run,
                Ok(None) => {
                    yield Ok(log_event("ERROR: Run not found", Some("error")));
                    break;
                }
                Err(e) => {
                    error!(run_id = %run_id, error = %e, "log stream query failed");
                    yield Ok(log_event("ERROR: Internal server error", Some("error")));
                    break;
                }
            };

            yield Ok(log_event(
                format!("[DEBUG] Status: {}, Ideas: {}", run.status, run.ideas_count),
                None,
            ));

            match run.status.as_str() {
                "completed" => {
                    yield Ok(log_event(
                        format!("✓ Successfully generated {} ideas!", run.ideas_count),
                        Some("success"),
                    ));
                    yield Ok(log_event("Generation complete. Redirecting...", Some("success")));
                    break;
                }
                "failed" => {
                    let message = run
                        .error_message
                        .as_deref()
                        .unwrap_or("Ошибка генерации");
                    yield Ok(log_event(format!("ERROR: {}", message), Some("error")));
                    break;
                }
                _ => match script.next() {
                    Some(line) => yield Ok(log_event(*line, None)),
                    None => yield Ok(log_event("Processing... Please wait...", None)),
                },
            }

            tokio::time::sleep(LOGS_POLL_INTERVAL).await;
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Serialize)]
struct LogLine {
    timestamp: f64,
    message: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

fn log_event(message: impl Into<String>, kind: Option<&'static str>) -> Event {
    let line = LogLine {
        timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
        message: message.into(),
        kind,
    };
    Event::default().data(serde_json::to_string(&line).unwrap_or_default())
}

fn named_event(name: &'static str, payload: &impl Serialize) -> Event {
    Event::default()
        .event(name)
        .data(serde_json::to_string(payload).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_line_without_kind_omits_type_field() {
        let line = LogLine {
            timestamp: 1_700_000_000.0,
            message: "Generating business ideas...".to_string(),
            kind: None,
        };
        let json = serde_json::to_value(&line).unwrap();
        assert!(json.get("type").is_none());
        assert_eq!(json["message"], "Generating business ideas...");
    }

    #[test]
    fn log_line_with_kind_renames_to_type() {
        let line = LogLine {
            timestamp: 1_700_000_000.0,
            message: "ERROR: Timeout exceeded".to_string(),
            kind: Some("error"),
        };
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["type"], "error");
    }

    #[test]
    fn script_covers_the_pipeline_stages() {
        assert_eq!(LOG_SCRIPT.len(), 12);
        assert!(LOG_SCRIPT[0].starts_with("Analyzing"));
    }
}
