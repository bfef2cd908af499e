//! Purchase endpoint: records intent clicks on ideas.

use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::domains::purchases::record_purchase;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::middleware::ClientMeta;

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub idea_id: i64,
}

/// POST /api/purchases
pub async fn create_purchase_handler(
    Extension(state): Extension<AxumAppState>,
    client: Option<Extension<ClientMeta>>,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (ip, user_agent) = match client {
        Some(Extension(meta)) => (meta.ip, meta.user_agent),
        None => (None, None),
    };

    let purchase_id = record_purchase(
        &state.db_pool,
        request.idea_id,
        ip.as_deref(),
        user_agent.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Идея не найдена".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Спасибо, запрос отправлен.",
        "purchase_id": purchase_id,
    })))
}
