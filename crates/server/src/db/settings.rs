//! Postgres-backed notification settings storage.

use async_trait::async_trait;
use sqlx::PgPool;

use stockwatch_core::NotificationSettings;

use crate::db::{DbError, SettingsStore};

#[derive(Debug, Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
    shop: String,
}

impl PgSettingsStore {
    #[must_use]
    pub fn new(pool: PgPool, shop: String) -> Self {
        Self { pool, shop }
    }
}

type SettingsRow = (String, bool, bool, i64, bool);

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get(&self) -> Result<NotificationSettings, DbError> {
        let row: Option<SettingsRow> = sqlx::query_as(
            r"
            SELECT email, disable_email, disable_dashboard, default_threshold, enable_auto_check
            FROM notification_settings
            WHERE shop = $1
            ",
        )
        .bind(&self.shop)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map_or_else(NotificationSettings::default, |row| {
            let (email, disable_email, disable_dashboard, default_threshold, enable_auto_check) =
                row;
            NotificationSettings {
                email,
                disable_email,
                disable_dashboard,
                default_threshold,
                enable_auto_check,
            }
        }))
    }

    async fn save(&self, settings: &NotificationSettings) -> Result<(), DbError> {
        sqlx::query(
            r"
            INSERT INTO notification_settings
                (shop, email, disable_email, disable_dashboard, default_threshold, enable_auto_check)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (shop) DO UPDATE SET
                email = EXCLUDED.email,
                disable_email = EXCLUDED.disable_email,
                disable_dashboard = EXCLUDED.disable_dashboard,
                default_threshold = EXCLUDED.default_threshold,
                enable_auto_check = EXCLUDED.enable_auto_check,
                updated_at = NOW()
            ",
        )
        .bind(&self.shop)
        .bind(&settings.email)
        .bind(settings.disable_email)
        .bind(settings.disable_dashboard)
        .bind(settings.default_threshold)
        .bind(settings.enable_auto_check)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
