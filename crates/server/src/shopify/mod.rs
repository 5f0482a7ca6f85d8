//! Shopify Admin REST API client (read-only catalog + inventory access).
//!
//! # Architecture
//!
//! - Direct REST calls to the versioned Admin API with a static
//!   `X-Shopify-Access-Token` header
//! - Variants do not carry `available` directly; inventory levels come
//!   from a separate batched endpoint and are merged back onto variants
//! - No retries here: a failed fetch is a hard failure for that attempt,
//!   and the check pipeline decides whether to degrade to fixture data
//!
//! # Example
//!
//! ```rust,ignore
//! use stockwatch_server::shopify::InventoryClient;
//!
//! let client = InventoryClient::new(&config.shopify)?;
//! let products = client.fetch_products().await?;
//! ```

pub mod client;
pub mod fixtures;
pub mod types;

pub use client::InventoryClient;
pub use fixtures::{fixture_products, FixtureSource};

use async_trait::async_trait;
use thiserror::Error;

use stockwatch_core::Product;

/// Maximum number of response-body bytes carried in a [`ShopifyError::Status`].
const MAX_ERROR_BODY_BYTES: usize = 500;

/// Errors that can occur when fetching from the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// Network, TLS, or timeout failure from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status.
    #[error("upstream returned {status} for {endpoint}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Endpoint path that failed.
        endpoint: String,
        /// Response body, truncated for diagnostics.
        body: String,
    },

    /// Rate limited by Shopify (HTTP 429).
    #[error("rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds from the `Retry-After` header (default 60).
        retry_after_secs: u64,
    },

    /// Response body was not the expected JSON shape.
    #[error("JSON parse error from {endpoint}: {source}")]
    Deserialize {
        /// Endpoint path that produced the body.
        endpoint: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Truncate a response body for inclusion in error diagnostics.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_BYTES {
        return body.to_owned();
    }
    let mut end = MAX_ERROR_BODY_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

/// Source of the product catalog snapshot consumed by the check pipeline.
///
/// The pipeline only depends on this seam, so tests and the fixture
/// fallback can stand in for the live API.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetch the full product catalog with per-variant available
    /// quantities populated.
    async fn fetch_products(&self) -> Result<Vec<Product>, ShopifyError>;
}
