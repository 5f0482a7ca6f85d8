//! Product catalog snapshot types.
//!
//! A [`Product`] is an immutable snapshot taken during one check cycle.
//! Products are not persisted beyond the cycle except inside history
//! entries.

use serde::{Deserialize, Serialize};

use super::id::{ProductId, VariantId};

/// A product and its variants as fetched from the upstream catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Upstream product identifier.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// Variants in upstream order.
    pub variants: Vec<Variant>,
}

/// A single product variant with its resolved stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Upstream variant identifier.
    pub id: VariantId,
    /// Whether stock for this variant is actively managed by the platform.
    /// Untracked variants are excluded from aggregate stock entirely.
    pub tracked: bool,
    /// Available quantity. Defaults to 0 when the upstream inventory-level
    /// lookup has no entry for this variant's inventory item.
    pub available: i64,
}

impl Product {
    /// Sum of `available` over tracked variants.
    ///
    /// A product with only untracked variants aggregates to 0 and will be
    /// flagged low-stock for any non-negative threshold.
    #[must_use]
    pub fn aggregate_stock(&self) -> i64 {
        self.variants
            .iter()
            .filter(|v| v.tracked)
            .map(|v| v.available)
            .sum()
    }
}
