//! Canned catalog data for development and degraded operation.

use async_trait::async_trait;

use stockwatch_core::{Product, ProductId, Variant, VariantId};

use crate::shopify::{ProductSource, ShopifyError};

/// Build the canned catalog used when live data is unavailable.
///
/// Quantities are deliberately low so every pipeline stage has work to
/// do when running against fixtures.
#[must_use]
pub fn fixture_products() -> Vec<Product> {
    vec![
        Product {
            id: ProductId::from(9_001),
            title: "Sample Hoodie".to_owned(),
            variants: vec![
                Variant {
                    id: VariantId::from(9_101),
                    tracked: true,
                    available: 2,
                },
                Variant {
                    id: VariantId::from(9_102),
                    tracked: true,
                    available: 1,
                },
            ],
        },
        Product {
            id: ProductId::from(9_002),
            title: "Sample Tee".to_owned(),
            variants: vec![Variant {
                id: VariantId::from(9_201),
                tracked: true,
                available: 0,
            }],
        },
        Product {
            id: ProductId::from(9_003),
            title: "Sample Poster".to_owned(),
            variants: vec![Variant {
                id: VariantId::from(9_301),
                tracked: false,
                available: 0,
            }],
        },
        Product {
            id: ProductId::from(9_004),
            title: "Sample Mug".to_owned(),
            variants: vec![Variant {
                id: VariantId::from(9_401),
                tracked: true,
                available: 24,
            }],
        },
    ]
}

/// A [`ProductSource`] that always serves the canned catalog.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource;

#[async_trait]
impl ProductSource for FixtureSource {
    async fn fetch_products(&self) -> Result<Vec<Product>, ShopifyError> {
        Ok(fixture_products())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_catalog_covers_stock_bands() {
        let products = fixture_products();
        assert!(products.iter().any(|p| p.aggregate_stock() == 0));
        assert!(products.iter().any(|p| (1..=5).contains(&p.aggregate_stock())));
        assert!(products.iter().any(|p| p.aggregate_stock() > 5));
    }

    #[test]
    fn test_fixture_catalog_has_untracked_product() {
        let products = fixture_products();
        assert!(products
            .iter()
            .any(|p| p.variants.iter().all(|v| !v.tracked)));
    }
}
