//! Check history types.
//!
//! Each low-stock check appends exactly one [`HistoryEntry`], even when
//! nothing was flagged - an entry with `item_count == 0` proves the check
//! executed. Entries are never mutated after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ProductId, VariantId};
use super::product::Product;

/// Default retention bound: only the most recent entries are kept.
pub const DEFAULT_HISTORY_RETENTION: i64 = 100;

/// Stock for one tracked variant of a flagged product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantStock {
    /// Variant identifier.
    pub variant_id: VariantId,
    /// Available quantity at evaluation time.
    pub available: i64,
}

/// Summary of one product flagged by a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockItem {
    /// Product identifier.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// Aggregate tracked-variant stock at evaluation time.
    pub total_available: i64,
    /// Per-variant quantities (tracked variants only).
    pub variants: Vec<VariantStock>,
}

impl LowStockItem {
    /// Build a summary from a product snapshot.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            total_available: product.aggregate_stock(),
            variants: product
                .variants
                .iter()
                .filter(|v| v.tracked)
                .map(|v| VariantStock {
                    variant_id: v.id,
                    available: v.available,
                })
                .collect(),
        }
    }
}

/// Immutable record of one check's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
    /// The default threshold that actually produced `items`, captured at
    /// evaluation time - never re-read from settings afterwards.
    pub threshold: i64,
    /// Number of flagged products.
    pub item_count: i64,
    /// Flagged products in catalog order.
    pub items: Vec<LowStockItem>,
}

impl HistoryEntry {
    /// Create an entry timestamped now.
    #[must_use]
    pub fn new(threshold: i64, items: Vec<LowStockItem>) -> Self {
        Self::at(Utc::now(), threshold, items)
    }

    /// Create an entry with an explicit timestamp.
    #[must_use]
    pub fn at(checked_at: DateTime<Utc>, threshold: i64, items: Vec<LowStockItem>) -> Self {
        let item_count = items.len() as i64;
        Self {
            checked_at,
            threshold,
            item_count,
            items,
        }
    }
}

/// Reporting window for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    /// One calendar day.
    Daily,
    /// The Sunday..=Saturday week containing the date.
    Weekly,
    /// One calendar month.
    Monthly,
}

impl ReportPeriod {
    /// Human-readable label, e.g. for report subjects.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }

    /// Lowercase wire name, matching the URL path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Error returned when parsing an unknown report period.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown report period: {0:?} (expected daily, weekly, or monthly)")]
pub struct ReportPeriodError(pub String);

impl std::str::FromStr for ReportPeriod {
    type Err = ReportPeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(ReportPeriodError(other.to_owned())),
        }
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::product::Variant;

    #[test]
    fn test_entry_counts_items() {
        let entry = HistoryEntry::new(5, vec![]);
        assert_eq!(entry.item_count, 0);
        assert!(entry.items.is_empty());
    }

    #[test]
    fn test_low_stock_item_skips_untracked_variants() {
        let product = Product {
            id: ProductId::new(9),
            title: "Socks".to_owned(),
            variants: vec![
                Variant {
                    id: VariantId::new(1),
                    tracked: true,
                    available: 2,
                },
                Variant {
                    id: VariantId::new(2),
                    tracked: false,
                    available: 99,
                },
            ],
        };

        let item = LowStockItem::from_product(&product);
        assert_eq!(item.total_available, 2);
        assert_eq!(item.variants.len(), 1);
        assert_eq!(item.variants[0].variant_id, VariantId::new(1));
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("daily".parse::<ReportPeriod>().unwrap(), ReportPeriod::Daily);
        assert_eq!(
            "weekly".parse::<ReportPeriod>().unwrap(),
            ReportPeriod::Weekly
        );
        assert_eq!(
            "monthly".parse::<ReportPeriod>().unwrap(),
            ReportPeriod::Monthly
        );
        assert!("yearly".parse::<ReportPeriod>().is_err());
    }

    #[test]
    fn test_period_serde_lowercase() {
        let json = serde_json::to_string(&ReportPeriod::Weekly).unwrap();
        assert_eq!(json, r#""weekly""#);
    }
}
