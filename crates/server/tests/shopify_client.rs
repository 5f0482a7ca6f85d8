//! Integration tests for `InventoryClient::fetch_products`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made. Covers the happy path, inventory-level
//! batching, missing-level defaulting, and every error variant the
//! client can produce.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use stockwatch_core::ProductId;
use stockwatch_server::shopify::{InventoryClient, ProductSource, ShopifyError};

/// Builds an `InventoryClient` pointed at the mock server.
fn test_client(server: &MockServer) -> InventoryClient {
    InventoryClient::with_base_url(
        server.uri(),
        "shpat_test_token".into(),
        Duration::from_secs(5),
    )
    .expect("failed to build test InventoryClient")
}

/// One product with `count` shopify-tracked variants, inventory item
/// ids starting at `first_item_id`.
fn product_json(id: i64, first_item_id: i64, count: i64) -> serde_json::Value {
    let variants: Vec<serde_json::Value> = (0..count)
        .map(|n| {
            json!({
                "id": id * 100 + n,
                "inventory_item_id": first_item_id + n,
                "inventory_management": "shopify"
            })
        })
        .collect();
    json!({ "id": id, "title": format!("Product {id}"), "variants": variants })
}

#[tokio::test]
async fn fetch_products_returns_empty_catalog() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"products": []})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let products = client.fetch_products().await.expect("expected Ok");

    assert!(products.is_empty());
}

#[tokio::test]
async fn fetch_products_sends_access_token_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(header("X-Shopify-Access-Token", "shpat_test_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"products": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.fetch_products().await.expect("expected Ok");
}

#[tokio::test]
async fn fetch_products_resolves_inventory_levels() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&json!({ "products": [product_json(1, 1000, 2)] })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/inventory_levels.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "inventory_levels": [
                { "inventory_item_id": 1000, "available": 3 },
                { "inventory_item_id": 1001, "available": 4 }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let products = client.fetch_products().await.expect("expected Ok");

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, ProductId::new(1));
    assert_eq!(products[0].aggregate_stock(), 7);
}

#[tokio::test]
async fn fetch_products_sums_levels_across_locations() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&json!({ "products": [product_json(1, 1000, 1)] })),
        )
        .mount(&server)
        .await;

    // Two warehouses report the same inventory item.
    Mock::given(method("GET"))
        .and(path("/inventory_levels.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "inventory_levels": [
                { "inventory_item_id": 1000, "available": 2 },
                { "inventory_item_id": 1000, "available": 5 }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let products = client.fetch_products().await.expect("expected Ok");

    assert_eq!(products[0].aggregate_stock(), 7);
}

#[tokio::test]
async fn fetch_products_defaults_missing_levels_to_zero() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&json!({ "products": [product_json(1, 1000, 2)] })),
        )
        .mount(&server)
        .await;

    // Only one of the two items has a level row; null counts as zero too.
    Mock::given(method("GET"))
        .and(path("/inventory_levels.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "inventory_levels": [
                { "inventory_item_id": 1000, "available": null }
            ]
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let products = client.fetch_products().await.expect("expected Ok");

    assert_eq!(products[0].aggregate_stock(), 0);
}

#[tokio::test]
async fn fetch_products_batches_inventory_requests_in_chunks_of_fifty() {
    let server = MockServer::start().await;

    // 3 products x 40 tracked variants = 120 inventory items, which
    // must arrive as exactly 3 batched requests.
    let products = json!({
        "products": [
            product_json(1, 1000, 40),
            product_json(2, 2000, 40),
            product_json(3, 3000, 40)
        ]
    });

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&products))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/inventory_levels.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&json!({ "inventory_levels": [] })),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.fetch_products().await.expect("expected Ok");

    // Every batch must stay within the 50-id cap.
    for request in server
        .received_requests()
        .await
        .expect("requests recorded")
        .iter()
        .filter(|r| r.url.path() == "/inventory_levels.json")
    {
        let ids = query_value(request, "inventory_item_ids");
        assert!(ids.split(',').count() <= 50, "chunk larger than 50 ids");
    }
}

fn query_value(request: &Request, name: &str) -> String {
    request
        .url
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

#[tokio::test]
async fn fetch_products_requests_trimmed_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("limit", "250"))
        .and(query_param("fields", "id,title,variants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"products": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.fetch_products().await.expect("expected Ok");
}

#[tokio::test]
async fn fetch_products_maps_server_error_to_status_variant() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.fetch_products().await.expect_err("expected Err");

    match err {
        ShopifyError::Status {
            status,
            endpoint,
            body,
        } => {
            assert_eq!(status, 503);
            assert_eq!(endpoint, "/products.json");
            assert_eq!(body, "upstream down");
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_products_truncates_long_error_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(2000)))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.fetch_products().await.expect_err("expected Err");

    match err {
        ShopifyError::Status { body, .. } => {
            assert!(body.len() < 600, "body not truncated: {} bytes", body.len());
            assert!(body.ends_with("..."));
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_products_surfaces_rate_limiting_with_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "12")
                .set_body_string("slow down"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.fetch_products().await.expect_err("expected Err");

    match err {
        ShopifyError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 12),
        other => panic!("expected RateLimited error, got: {other:?}"),
    }
}

#[tokio::test]
async fn fetch_products_rejects_malformed_json() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.fetch_products().await.expect_err("expected Err");

    assert!(
        matches!(err, ShopifyError::Deserialize { ref endpoint, .. } if endpoint == "/products.json"),
        "expected Deserialize error, got: {err:?}"
    );
}
