//! Custom threshold endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::instrument;

use stockwatch_core::ThresholdMap;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub message: String,
    pub count: usize,
}

/// Current per-product overrides as a `{ "product_id": threshold }` map.
#[instrument(skip(state))]
pub async fn get_thresholds(
    State(state): State<AppState>,
) -> Result<Json<ThresholdMap>, AppError> {
    Ok(Json(state.thresholds.get().await?))
}

/// Replace all overrides with the posted map. Products absent from the
/// body lose their override.
#[instrument(skip(state, body))]
pub async fn replace_thresholds(
    State(state): State<AppState>,
    Json(body): Json<ThresholdMap>,
) -> Result<Json<SavedResponse>, AppError> {
    let count = body.len();
    state.thresholds.replace(&body).await?;

    Ok(Json(SavedResponse {
        message: "Custom thresholds saved".to_string(),
        count,
    }))
}
