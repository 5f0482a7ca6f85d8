//! Catalog listing endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::instrument;

use stockwatch_core::Product;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
    pub used_fixtures: bool,
}

/// The full fetched catalog, with the fixture policy applied.
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductsResponse>, AppError> {
    let (products, used_fixtures) = state
        .checker
        .snapshot_catalog()
        .await
        .map_err(|e| AppError::Shopify(e.0))?;

    Ok(Json(ProductsResponse {
        products,
        used_fixtures,
    }))
}
