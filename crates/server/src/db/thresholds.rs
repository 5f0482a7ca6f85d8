//! Postgres-backed custom threshold storage.

use async_trait::async_trait;
use sqlx::PgPool;

use stockwatch_core::{ProductId, ThresholdMap};

use crate::db::{DbError, ThresholdStore};

#[derive(Debug, Clone)]
pub struct PgThresholdStore {
    pool: PgPool,
    shop: String,
}

impl PgThresholdStore {
    #[must_use]
    pub fn new(pool: PgPool, shop: String) -> Self {
        Self { pool, shop }
    }
}

#[async_trait]
impl ThresholdStore for PgThresholdStore {
    async fn get(&self) -> Result<ThresholdMap, DbError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT product_id, threshold FROM custom_thresholds WHERE shop = $1",
        )
        .bind(&self.shop)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, threshold)| (ProductId::from(product_id), threshold))
            .collect())
    }

    async fn replace(&self, thresholds: &ThresholdMap) -> Result<(), DbError> {
        let (product_ids, values): (Vec<i64>, Vec<i64>) = thresholds
            .iter()
            .map(|(id, threshold)| (i64::from(id), threshold))
            .unzip();

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM custom_thresholds WHERE shop = $1")
            .bind(&self.shop)
            .execute(&mut *tx)
            .await?;

        if !product_ids.is_empty() {
            sqlx::query(
                r"
                INSERT INTO custom_thresholds (shop, product_id, threshold)
                SELECT $1, ids.product_id, ids.threshold
                FROM UNNEST($2::BIGINT[], $3::BIGINT[]) AS ids(product_id, threshold)
                ",
            )
            .bind(&self.shop)
            .bind(&product_ids)
            .bind(&values)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
