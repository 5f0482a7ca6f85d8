//! Wire types for the Shopify Admin REST API.

use serde::Deserialize;

use stockwatch_core::{InventoryItemId, Product, ProductId, Variant, VariantId};

/// Inventory management values that mean Shopify tracks the variant.
const SHOPIFY_MANAGED: &str = "shopify";

/// Response envelope for `GET /products.json`.
#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<RestProduct>,
}

/// A product as returned by the Admin REST API, trimmed to the fields
/// we request.
#[derive(Debug, Deserialize)]
pub struct RestProduct {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub variants: Vec<RestVariant>,
}

#[derive(Debug, Deserialize)]
pub struct RestVariant {
    pub id: i64,
    pub inventory_item_id: Option<i64>,
    pub inventory_management: Option<String>,
}

impl RestVariant {
    /// Whether Shopify tracks inventory for this variant.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.inventory_management.as_deref() == Some(SHOPIFY_MANAGED)
    }

    #[must_use]
    pub fn inventory_item_id(&self) -> Option<InventoryItemId> {
        self.inventory_item_id.map(InventoryItemId::from)
    }
}

/// Response envelope for `GET /inventory_levels.json`.
#[derive(Debug, Deserialize)]
pub struct InventoryLevelsResponse {
    pub inventory_levels: Vec<InventoryLevelRow>,
}

/// One inventory level row. `available` is null for untracked or
/// unstocked items; we treat that as zero.
#[derive(Debug, Deserialize)]
pub struct InventoryLevelRow {
    pub inventory_item_id: i64,
    pub available: Option<i64>,
}

impl RestProduct {
    /// Convert to the domain product, resolving each tracked variant's
    /// available quantity through `lookup`. Items with no level row
    /// resolve to zero.
    pub fn into_product(self, lookup: impl Fn(InventoryItemId) -> Option<i64>) -> Product {
        let variants = self
            .variants
            .into_iter()
            .map(|v| {
                let tracked = v.is_tracked();
                let available = v
                    .inventory_item_id()
                    .and_then(&lookup)
                    .unwrap_or(0);
                Variant {
                    id: VariantId::from(v.id),
                    tracked,
                    available,
                }
            })
            .collect();
        Product {
            id: ProductId::from(self.id),
            title: self.title,
            variants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(management: Option<&str>) -> RestVariant {
        RestVariant {
            id: 1,
            inventory_item_id: Some(100),
            inventory_management: management.map(str::to_owned),
        }
    }

    #[test]
    fn test_shopify_management_is_tracked() {
        assert!(variant(Some("shopify")).is_tracked());
    }

    #[test]
    fn test_other_management_not_tracked() {
        assert!(!variant(Some("fulfillment-service")).is_tracked());
        assert!(!variant(None).is_tracked());
    }

    #[test]
    fn test_into_product_resolves_levels() {
        let rest = RestProduct {
            id: 42,
            title: "Widget".to_owned(),
            variants: vec![
                RestVariant {
                    id: 1,
                    inventory_item_id: Some(100),
                    inventory_management: Some("shopify".to_owned()),
                },
                RestVariant {
                    id: 2,
                    inventory_item_id: Some(200),
                    inventory_management: Some("shopify".to_owned()),
                },
            ],
        };
        let product = rest.into_product(|id| (id == InventoryItemId::from(100)).then_some(7));
        assert_eq!(product.id, ProductId::from(42));
        assert_eq!(product.variants[0].available, 7);
        // No level row means zero available.
        assert_eq!(product.variants[1].available, 0);
        assert_eq!(product.aggregate_stock(), 7);
    }

    #[test]
    fn test_into_product_missing_inventory_item_id() {
        let rest = RestProduct {
            id: 1,
            title: "No item id".to_owned(),
            variants: vec![RestVariant {
                id: 9,
                inventory_item_id: None,
                inventory_management: Some("shopify".to_owned()),
            }],
        };
        let product = rest.into_product(|_| Some(99));
        assert_eq!(product.variants[0].available, 0);
    }

    #[test]
    fn test_deserialize_products_response() {
        let json = r#"{"products":[{"id":1,"title":"A","variants":[{"id":10,"inventory_item_id":100,"inventory_management":"shopify"}]}]}"#;
        let parsed: ProductsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.products.len(), 1);
        assert_eq!(parsed.products[0].variants[0].id, 10);
    }

    #[test]
    fn test_deserialize_level_with_null_available() {
        let json = r#"{"inventory_levels":[{"inventory_item_id":5,"available":null}]}"#;
        let parsed: InventoryLevelsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.inventory_levels[0].available, None);
    }
}
