//! REST client for the Shopify Admin API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use stockwatch_core::{InventoryItemId, Product};

use crate::config::ShopifyConfig;
use crate::shopify::types::{InventoryLevelsResponse, ProductsResponse, RestProduct};
use crate::shopify::{truncate_body, ProductSource, ShopifyError};

/// Inventory item ids per `inventory_levels.json` request. The Admin
/// API caps the `inventory_item_ids` filter at 50 ids.
const INVENTORY_CHUNK_SIZE: usize = 50;

/// Concurrent in-flight inventory level requests.
const MAX_CONCURRENT_CHUNKS: usize = 4;

/// Fallback when a 429 response has no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Client for the Shopify Admin REST API.
///
/// Holds a connection pool; cheap to clone.
#[derive(Debug, Clone)]
pub struct InventoryClient {
    client: reqwest::Client,
    base_url: String,
    access_token: SecretString,
}

impl InventoryClient {
    /// Build a client from the application's Shopify configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        Self::with_base_url(
            config.api_base_url(),
            config.access_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Build a client against an explicit base URL. Used by tests to
    /// point at a local mock server.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn with_base_url(
        base_url: String,
        access_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stockwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            access_token,
        })
    }

    /// Issue a GET and parse the JSON body, mapping non-success
    /// statuses to typed errors.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ShopifyError> {
        let url = format!("{}{endpoint}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("X-Shopify-Access-Token", self.access_token.expose_secret())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map_or(DEFAULT_RETRY_AFTER_SECS, |s| s.ceil() as u64);
            return Err(ShopifyError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_owned(),
                body: truncate_body(&body),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ShopifyError::Deserialize {
            endpoint: endpoint.to_owned(),
            source,
        })
    }

    /// Fetch the raw product list, without inventory levels resolved.
    async fn fetch_raw_products(&self) -> Result<Vec<RestProduct>, ShopifyError> {
        let response: ProductsResponse = self
            .get_json(
                "/products.json",
                &[
                    ("limit", "250".to_owned()),
                    ("fields", "id,title,variants".to_owned()),
                ],
            )
            .await?;
        Ok(response.products)
    }

    /// Fetch available quantities for the given inventory items,
    /// batching requests and summing quantities across locations.
    async fn fetch_inventory_levels(
        &self,
        item_ids: &[InventoryItemId],
    ) -> Result<HashMap<InventoryItemId, i64>, ShopifyError> {
        let chunks: Vec<String> = item_ids
            .chunks(INVENTORY_CHUNK_SIZE)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();

        let responses: Vec<InventoryLevelsResponse> = stream::iter(chunks)
            .map(|ids| async move {
                self.get_json::<InventoryLevelsResponse>(
                    "/inventory_levels.json",
                    &[("inventory_item_ids", ids), ("limit", "250".to_owned())],
                )
                .await
            })
            .buffered(MAX_CONCURRENT_CHUNKS)
            .try_collect()
            .await?;

        let mut levels: HashMap<InventoryItemId, i64> = HashMap::new();
        for response in responses {
            for row in response.inventory_levels {
                // A tracked item can have a row per location; sum them.
                *levels
                    .entry(InventoryItemId::from(row.inventory_item_id))
                    .or_insert(0) += row.available.unwrap_or(0);
            }
        }
        Ok(levels)
    }
}

#[async_trait]
impl ProductSource for InventoryClient {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<Product>, ShopifyError> {
        let raw = self.fetch_raw_products().await?;

        let item_ids: Vec<InventoryItemId> = raw
            .iter()
            .flat_map(|p| p.variants.iter())
            .filter_map(super::types::RestVariant::inventory_item_id)
            .collect();

        let levels = if item_ids.is_empty() {
            HashMap::new()
        } else {
            self.fetch_inventory_levels(&item_ids).await?
        };

        debug!(
            products = raw.len(),
            inventory_items = item_ids.len(),
            "fetched catalog snapshot"
        );

        Ok(raw
            .into_iter()
            .map(|p| p.into_product(|id| levels.get(&id).copied()))
            .collect())
    }
}
