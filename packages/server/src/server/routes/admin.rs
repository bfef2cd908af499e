//! Admin endpoints, guarded by a static API key header.

use axum::{extract::Extension, http::HeaderMap, Json};

use crate::domains::purchases::{purchase_stats, PurchaseStats};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

/// GET /api/admin/purchases
///
/// Requires the `X-API-Key` header to match `ADMIN_API_KEY`.
pub async fn admin_purchases_handler(
    Extension(state): Extension<AxumAppState>,
    headers: HeaderMap,
) -> Result<Json<PurchaseStats>, ApiError> {
    let provided = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok());

    if provided != Some(state.config.admin_api_key.as_str()) {
        return Err(ApiError::Unauthorized("Неверный API ключ".to_string()));
    }

    let stats = purchase_stats(&state.db_pool).await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::kernel::jobs::PostgresJobQueue;
    use axum::http::HeaderValue;
    use sqlx::postgres::PgPool;
    use std::sync::Arc;

    // Lazy pool never connects; the key check rejects before any query
    fn state() -> AxumAppState {
        let pool = PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        AxumAppState {
            db_pool: pool.clone(),
            queue: PostgresJobQueue::new(pool),
            config: Arc::new(Config {
                database_url: "postgres://localhost/unused".to_string(),
                port: 8080,
                openrouter_api_key: "key".to_string(),
                openrouter_base_url: None,
                openrouter_model: "anthropic/claude-3.5-sonnet".to_string(),
                tavily_api_key: None,
                admin_api_key: "secret".to_string(),
                rate_limit_runs_per_hour: 5,
                generation_timeout_seconds: 600,
            }),
        }
    }

    #[tokio::test]
    async fn missing_key_is_rejected() {
        let result = admin_purchases_handler(Extension(state()), HeaderMap::new()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn wrong_key_is_rejected_with_the_russian_message() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("nope"));

        let result = admin_purchases_handler(Extension(state()), headers).await;
        assert!(matches!(
            result,
            Err(ApiError::Unauthorized(message)) if message == "Неверный API ключ"
        ));
    }
}
