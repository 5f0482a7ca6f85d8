//! Postgres-backed check history storage.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use sqlx::PgPool;

use stockwatch_core::{HistoryEntry, LowStockItem, ReportPeriod};

use crate::db::{DbError, HistoryStore};

/// Half-open UTC bounds `[start, end)` of the calendar period
/// containing `date`. Weeks run Sunday through Saturday.
#[must_use]
pub fn period_bounds(period: ReportPeriod, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let (start, end) = match period {
        ReportPeriod::Daily => (date, date + Duration::days(1)),
        ReportPeriod::Weekly => {
            let start = date - Duration::days(i64::from(date.weekday().num_days_from_sunday()));
            (start, start + Duration::days(7))
        }
        ReportPeriod::Monthly => {
            let start = date.with_day(1).unwrap_or(date);
            let end = if start.month() == 12 {
                start
                    .with_year(start.year() + 1)
                    .and_then(|d| d.with_month(1))
            } else {
                start.with_month(start.month() + 1)
            }
            .unwrap_or(start);
            (start, end)
        }
    };
    (
        start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        end.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
    )
}

#[derive(Debug, Clone)]
pub struct PgHistoryStore {
    pool: PgPool,
    shop: String,
    retention: i64,
}

impl PgHistoryStore {
    #[must_use]
    pub fn new(pool: PgPool, shop: String, retention: i64) -> Self {
        Self {
            pool,
            shop,
            retention,
        }
    }
}

type HistoryRow = (DateTime<Utc>, i64, i64, serde_json::Value);

fn entry_from_row((checked_at, threshold, item_count, items): HistoryRow) -> Result<HistoryEntry, DbError> {
    let items: Vec<LowStockItem> = serde_json::from_value(items)?;
    Ok(HistoryEntry {
        checked_at,
        threshold,
        item_count,
        items,
    })
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn append(&self, entry: &HistoryEntry) -> Result<(), DbError> {
        let items = serde_json::to_value(&entry.items)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO low_stock_history (shop, checked_at, threshold, item_count, items)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&self.shop)
        .bind(entry.checked_at)
        .bind(entry.threshold)
        .bind(entry.item_count)
        .bind(items)
        .execute(&mut *tx)
        .await?;

        // Keep only the newest entries within the retention bound.
        sqlx::query(
            r"
            DELETE FROM low_stock_history
            WHERE shop = $1
              AND id NOT IN (
                  SELECT id FROM low_stock_history
                  WHERE shop = $1
                  ORDER BY checked_at DESC, id DESC
                  LIMIT $2
              )
            ",
        )
        .bind(&self.shop)
        .bind(self.retention)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<HistoryEntry>, DbError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r"
            SELECT checked_at, threshold, item_count, items
            FROM low_stock_history
            WHERE shop = $1
            ORDER BY checked_at DESC, id DESC
            ",
        )
        .bind(&self.shop)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }

    async fn for_period(
        &self,
        period: ReportPeriod,
        date: Option<NaiveDate>,
    ) -> Result<Vec<HistoryEntry>, DbError> {
        let Some(date) = date else {
            return self.list_all().await;
        };
        let (start, end) = period_bounds(period, date);

        let rows: Vec<HistoryRow> = sqlx::query_as(
            r"
            SELECT checked_at, threshold, item_count, items
            FROM low_stock_history
            WHERE shop = $1 AND checked_at >= $2 AND checked_at < $3
            ORDER BY checked_at ASC, id ASC
            ",
        )
        .bind(&self.shop)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }
}
