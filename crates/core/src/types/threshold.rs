//! Per-product threshold overrides.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Mapping from product identifier to an overriding stock threshold.
///
/// Absence of a key means "use the default threshold for the check".
/// An explicit `0` is a real override and is honored; it expresses
/// "alert me only when this product is literally out of stock". Negative
/// overrides are permitted and simply make the product harder to flag.
///
/// The map is replaced wholesale on save; there are no partial-update
/// semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdMap(HashMap<ProductId, i64>);

impl ThresholdMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Set the override for a product.
    pub fn set(&mut self, product_id: ProductId, threshold: i64) {
        self.0.insert(product_id, threshold);
    }

    /// The override for a product, if one exists.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<i64> {
        self.0.get(&product_id).copied()
    }

    /// Effective threshold for a product: the override if present
    /// (including an explicit `0`), else `default`.
    #[must_use]
    pub fn effective(&self, product_id: ProductId, default: i64) -> i64 {
        self.get(product_id).unwrap_or(default)
    }

    /// Number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map holds no overrides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(product_id, threshold)` pairs. Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (ProductId, i64)> + '_ {
        self.0.iter().map(|(id, t)| (*id, *t))
    }
}

impl FromIterator<(ProductId, i64)> for ThresholdMap {
    fn from_iter<I: IntoIterator<Item = (ProductId, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_uses_override() {
        let map: ThresholdMap = [(ProductId::new(1), 2)].into_iter().collect();
        assert_eq!(map.effective(ProductId::new(1), 5), 2);
    }

    #[test]
    fn test_effective_falls_back_to_default() {
        let map = ThresholdMap::new();
        assert_eq!(map.effective(ProductId::new(1), 5), 5);
    }

    #[test]
    fn test_explicit_zero_override_is_honored() {
        // Regression guard: an explicit 0 must not be treated as missing.
        let map: ThresholdMap = [(ProductId::new(1), 0)].into_iter().collect();
        assert_eq!(map.effective(ProductId::new(1), 5), 0);
    }

    #[test]
    fn test_negative_override_is_permitted() {
        let map: ThresholdMap = [(ProductId::new(1), -1)].into_iter().collect();
        assert_eq!(map.effective(ProductId::new(1), 5), -1);
    }

    #[test]
    fn test_serde_object_shape() {
        let map: ThresholdMap = [(ProductId::new(123), 2)].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"123":2}"#);
        let back: ThresholdMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
