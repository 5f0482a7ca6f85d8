//! On-demand low-stock check endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stockwatch_core::LowStockItem;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    /// Overrides the settings default threshold for this one check.
    pub threshold: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub message: String,
    pub threshold: i64,
    pub items: Vec<LowStockItem>,
    pub used_fixtures: bool,
    pub history_recorded: bool,
}

/// Run the check pipeline now and dispatch notifications per settings.
#[instrument(skip(state))]
pub async fn check_low_stock(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<CheckResponse>, AppError> {
    let threshold = match query.threshold {
        Some(threshold) => threshold,
        None => state.notifier.settings().await.default_threshold,
    };

    let outcome = state
        .checker
        .check_low_stock(threshold)
        .await
        .map_err(|e| AppError::Shopify(e.0))?;

    state.notifier.notify_low_stock(&outcome.entry).await;

    let message = if outcome.entry.items.is_empty() {
        "All products are sufficiently stocked".to_string()
    } else {
        format!(
            "{} product(s) at or below threshold {threshold}",
            outcome.entry.item_count
        )
    };

    Ok(Json(CheckResponse {
        message,
        threshold,
        items: outcome.entry.items,
        used_fixtures: outcome.used_fixtures,
        history_recorded: outcome.history_recorded,
    }))
}
