//! Database access layer.
//!
//! Each concern gets a capability trait so the pipeline and routes stay
//! decoupled from Postgres; tests substitute in-memory implementations.
//! One Postgres implementation per trait is constructed at startup and
//! shared through application state.

pub mod email_log;
pub mod history;
pub mod settings;
pub mod thresholds;

pub use email_log::{EmailRecord, NewEmailRecord, PgEmailLogStore};
pub use history::{period_bounds, PgHistoryStore};
pub use settings::PgSettingsStore;
pub use thresholds::PgThresholdStore;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

use stockwatch_core::{
    EmailLogId, HistoryEntry, NotificationSettings, ReportPeriod, ThresholdMap,
};

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A JSONB column held data we could not decode.
    #[error("stored JSON was invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Per-product custom threshold storage.
#[async_trait]
pub trait ThresholdStore: Send + Sync {
    /// Load the full custom threshold map for the shop.
    async fn get(&self) -> Result<ThresholdMap, DbError>;

    /// Replace the shop's threshold map wholesale.
    ///
    /// Runs in one transaction so concurrent readers never observe the
    /// window between delete and insert.
    async fn replace(&self, thresholds: &ThresholdMap) -> Result<(), DbError>;
}

/// Low-stock check history storage.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a completed check result, then prune entries beyond the
    /// retention bound.
    async fn append(&self, entry: &HistoryEntry) -> Result<(), DbError>;

    /// All entries, newest first.
    async fn list_all(&self) -> Result<Vec<HistoryEntry>, DbError>;

    /// Entries whose check time falls in the calendar period containing
    /// `date` (daily = that day, weekly = Sunday through Saturday,
    /// monthly = that calendar month), oldest first. With no date the
    /// full history is returned, newest first.
    async fn for_period(
        &self,
        period: ReportPeriod,
        date: Option<NaiveDate>,
    ) -> Result<Vec<HistoryEntry>, DbError>;
}

/// Notification settings storage. A shop has at most one row; reads
/// fall back to defaults when none exists.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<NotificationSettings, DbError>;

    /// Upsert the shop's settings atomically.
    async fn save(&self, settings: &NotificationSettings) -> Result<(), DbError>;
}

/// Dashboard email inbox storage.
#[async_trait]
pub trait EmailLogStore: Send + Sync {
    async fn append(&self, email: &NewEmailRecord) -> Result<EmailLogId, DbError>;

    /// All logged emails, newest first.
    async fn list(&self) -> Result<Vec<EmailRecord>, DbError>;

    /// Mark one email read. Returns false when the id does not exist.
    async fn mark_read(&self, id: EmailLogId) -> Result<bool, DbError>;

    /// Delete the given emails, returning how many rows went away.
    async fn delete_many(&self, ids: &[EmailLogId]) -> Result<u64, DbError>;
}
