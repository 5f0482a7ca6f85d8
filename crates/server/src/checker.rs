//! The low-stock check pipeline.
//!
//! One check is: snapshot the catalog, compare each product's aggregate
//! tracked stock against its effective threshold, record the result.
//! The pipeline degrades rather than aborts: threshold-load failures
//! fall back to an empty override map and recorder failures are
//! swallowed, so a flaky database never hides a live stock answer.

use std::sync::Arc;

use stockwatch_core::{HistoryEntry, LowStockItem, Product, ThresholdMap};
use tracing::{error, info, instrument, warn};

use crate::config::FixturePolicy;
use crate::db::{HistoryStore, ThresholdStore};
use crate::shopify::{fixture_products, ProductSource, ShopifyError};

/// Result of one completed check.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// The record built for this check, item ordering matching the
    /// catalog snapshot.
    pub entry: HistoryEntry,
    /// Whether the catalog came from canned fixture data instead of the
    /// live API.
    pub used_fixtures: bool,
    /// Whether the entry actually landed in history.
    pub history_recorded: bool,
}

/// A check failed outright. Only possible when the fixture policy
/// forbids degrading to canned data.
#[derive(Debug, thiserror::Error)]
#[error("catalog fetch failed: {0}")]
pub struct CheckError(#[from] pub ShopifyError);

/// Runs low-stock checks against a product source and records results.
#[derive(Clone)]
pub struct StockChecker {
    source: Arc<dyn ProductSource>,
    thresholds: Arc<dyn ThresholdStore>,
    history: Arc<dyn HistoryStore>,
    fixture_policy: FixturePolicy,
}

impl StockChecker {
    #[must_use]
    pub fn new(
        source: Arc<dyn ProductSource>,
        thresholds: Arc<dyn ThresholdStore>,
        history: Arc<dyn HistoryStore>,
        fixture_policy: FixturePolicy,
    ) -> Self {
        Self {
            source,
            thresholds,
            history,
            fixture_policy,
        }
    }

    /// Run one full check with the given default threshold.
    ///
    /// A history entry is appended even when nothing is flagged; an
    /// empty entry proves the check executed. The threshold recorded is
    /// the one that produced the result, captured here and never
    /// re-read.
    ///
    /// # Errors
    ///
    /// Fails only when the catalog cannot be fetched and the fixture
    /// policy is [`FixturePolicy::Never`].
    #[instrument(skip(self))]
    pub async fn check_low_stock(&self, default_threshold: i64) -> Result<CheckOutcome, CheckError> {
        let thresholds = match self.thresholds.get().await {
            Ok(map) => map,
            Err(err) => {
                // Degrade to defaults-only rather than failing the check.
                warn!(error = %err, "failed to load custom thresholds, using defaults only");
                ThresholdMap::new()
            }
        };

        let (products, used_fixtures) = self.snapshot_catalog().await?;

        let items: Vec<LowStockItem> = products
            .iter()
            .filter(|p| p.aggregate_stock() <= thresholds.effective(p.id, default_threshold))
            .map(LowStockItem::from_product)
            .collect();

        let entry = HistoryEntry::new(default_threshold, items);

        let history_recorded = match self.history.append(&entry).await {
            Ok(()) => true,
            Err(err) => {
                // The caller still gets the live answer.
                error!(error = %err, "failed to record check history");
                false
            }
        };

        info!(
            checked = products.len(),
            flagged = entry.item_count,
            threshold = default_threshold,
            used_fixtures,
            history_recorded,
            "low-stock check complete"
        );

        Ok(CheckOutcome {
            entry,
            used_fixtures,
            history_recorded,
        })
    }

    /// Fetch the catalog with the configured fixture policy applied.
    /// Returns the products and whether fixtures served them.
    ///
    /// # Errors
    ///
    /// Fails only when the fetch fails under [`FixturePolicy::Never`].
    pub async fn snapshot_catalog(&self) -> Result<(Vec<Product>, bool), CheckError> {
        match self.fixture_policy {
            FixturePolicy::Always => Ok((fixture_products(), true)),
            FixturePolicy::Never => Ok((self.source.fetch_products().await?, false)),
            FixturePolicy::OnError => match self.source.fetch_products().await {
                Ok(products) => Ok((products, false)),
                Err(err) => {
                    warn!(error = %err, "catalog fetch failed, serving fixture data");
                    Ok((fixture_products(), true))
                }
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    use stockwatch_core::{ProductId, ReportPeriod, Variant, VariantId};

    use crate::db::DbError;

    struct StaticSource(Result<Vec<Product>, ()>);

    #[async_trait]
    impl ProductSource for StaticSource {
        async fn fetch_products(&self) -> Result<Vec<Product>, ShopifyError> {
            match &self.0 {
                Ok(products) => Ok(products.clone()),
                Err(()) => Err(ShopifyError::Status {
                    status: 500,
                    endpoint: "/products.json".to_owned(),
                    body: String::new(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct MemThresholds(ThresholdMap);

    #[async_trait]
    impl ThresholdStore for MemThresholds {
        async fn get(&self) -> Result<ThresholdMap, DbError> {
            Ok(self.0.clone())
        }

        async fn replace(&self, _: &ThresholdMap) -> Result<(), DbError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemHistory {
        entries: Mutex<Vec<HistoryEntry>>,
        fail: bool,
    }

    #[async_trait]
    impl HistoryStore for MemHistory {
        async fn append(&self, entry: &HistoryEntry) -> Result<(), DbError> {
            if self.fail {
                return Err(DbError::Sqlx(sqlx::Error::PoolClosed));
            }
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }

        async fn list_all(&self) -> Result<Vec<HistoryEntry>, DbError> {
            Ok(self.entries.lock().unwrap().clone())
        }

        async fn for_period(
            &self,
            _: ReportPeriod,
            _: Option<NaiveDate>,
        ) -> Result<Vec<HistoryEntry>, DbError> {
            Ok(Vec::new())
        }
    }

    fn product(id: i64, title: &str, available: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: title.to_owned(),
            variants: vec![Variant {
                id: VariantId::new(id * 10),
                tracked: true,
                available,
            }],
        }
    }

    fn checker(
        products: Vec<Product>,
        thresholds: ThresholdMap,
        history: Arc<MemHistory>,
    ) -> StockChecker {
        StockChecker::new(
            Arc::new(StaticSource(Ok(products))),
            Arc::new(MemThresholds(thresholds)),
            history,
            FixturePolicy::Never,
        )
    }

    #[tokio::test]
    async fn test_flags_products_at_or_below_threshold() {
        let history = Arc::new(MemHistory::default());
        let checker = checker(
            vec![
                product(1, "At threshold", 5),
                product(2, "Below", 2),
                product(3, "Above", 6),
            ],
            ThresholdMap::new(),
            Arc::clone(&history),
        );

        let outcome = checker.check_low_stock(5).await.unwrap();

        assert_eq!(outcome.entry.item_count, 2);
        assert!(outcome.history_recorded);
        assert_eq!(history.entries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_override_suppresses_default() {
        // Product sits at 3, below the default of 5, but its explicit
        // override of 0 means only a literal stockout is flagged.
        let thresholds: ThresholdMap = [(ProductId::new(1), 0)].into_iter().collect();
        let checker = checker(
            vec![product(1, "Overridden", 3)],
            thresholds,
            Arc::new(MemHistory::default()),
        );

        let outcome = checker.check_low_stock(5).await.unwrap();
        assert_eq!(outcome.entry.item_count, 0);
    }

    #[tokio::test]
    async fn test_override_and_default_combine_in_one_run() {
        // Default 5 with one product overridden down to 2: the
        // overridden product at exactly 2 and the defaulted product at
        // 4 are both flagged.
        let thresholds: ThresholdMap = [(ProductId::new(1), 2)].into_iter().collect();
        let checker = checker(
            vec![product(1, "Overridden", 2), product(2, "Defaulted", 4)],
            thresholds,
            Arc::new(MemHistory::default()),
        );

        let outcome = checker.check_low_stock(5).await.unwrap();

        assert_eq!(outcome.entry.item_count, 2);
        let titles: Vec<&str> = outcome.entry.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Overridden", "Defaulted"]);
    }

    #[tokio::test]
    async fn test_untracked_only_product_is_flagged() {
        let untracked = Product {
            id: ProductId::new(1),
            title: "Untracked".to_owned(),
            variants: vec![Variant {
                id: VariantId::new(10),
                tracked: false,
                available: 99,
            }],
        };
        let checker = checker(
            vec![untracked],
            ThresholdMap::new(),
            Arc::new(MemHistory::default()),
        );

        let outcome = checker.check_low_stock(5).await.unwrap();
        // Aggregate tracked stock is zero, so it counts as low.
        assert_eq!(outcome.entry.item_count, 1);
        assert_eq!(outcome.entry.items[0].total_available, 0);
        assert!(outcome.entry.items[0].variants.is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_still_recorded() {
        let history = Arc::new(MemHistory::default());
        let checker = checker(
            vec![product(1, "Plenty", 100)],
            ThresholdMap::new(),
            Arc::clone(&history),
        );

        let outcome = checker.check_low_stock(5).await.unwrap();

        assert_eq!(outcome.entry.item_count, 0);
        assert!(outcome.history_recorded);
        assert_eq!(history.entries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recorder_failure_is_swallowed() {
        let history = Arc::new(MemHistory {
            entries: Mutex::new(Vec::new()),
            fail: true,
        });
        let checker = checker(
            vec![product(1, "Low", 1)],
            ThresholdMap::new(),
            Arc::clone(&history),
        );

        let outcome = checker.check_low_stock(5).await.unwrap();

        assert_eq!(outcome.entry.item_count, 1);
        assert!(!outcome.history_recorded);
    }

    #[tokio::test]
    async fn test_fetch_failure_with_policy_never_is_fatal() {
        let checker = StockChecker::new(
            Arc::new(StaticSource(Err(()))),
            Arc::new(MemThresholds::default()),
            Arc::new(MemHistory::default()),
            FixturePolicy::Never,
        );

        assert!(checker.check_low_stock(5).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_failure_with_policy_on_error_degrades() {
        let checker = StockChecker::new(
            Arc::new(StaticSource(Err(()))),
            Arc::new(MemThresholds::default()),
            Arc::new(MemHistory::default()),
            FixturePolicy::OnError,
        );

        let outcome = checker.check_low_stock(5).await.unwrap();
        assert!(outcome.used_fixtures);
        assert!(outcome.entry.item_count > 0);
    }

    #[tokio::test]
    async fn test_consecutive_runs_append_separate_entries() {
        let history = Arc::new(MemHistory::default());
        let checker = checker(
            vec![product(1, "Low", 1)],
            ThresholdMap::new(),
            Arc::clone(&history),
        );

        checker.check_low_stock(5).await.unwrap();
        checker.check_low_stock(3).await.unwrap();

        let entries = history.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].threshold, 5);
        assert_eq!(entries[1].threshold, 3);
    }
}
