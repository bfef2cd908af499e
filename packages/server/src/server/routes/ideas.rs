//! Idea detail endpoint.

use axum::{
    extract::{Extension, Path},
    Json,
};

use crate::domains::ideas::{idea_detail, IdeaFull};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

/// GET /api/ideas/:idea_id
pub async fn get_idea_handler(
    Extension(state): Extension<AxumAppState>,
    Path(idea_id): Path<i64>,
) -> Result<Json<IdeaFull>, ApiError> {
    let idea = idea_detail(&state.db_pool, idea_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Идея не найдена".to_string()))?;

    Ok(Json(idea))
}
