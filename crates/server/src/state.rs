//! Shared application state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::checker::StockChecker;
use crate::config::AppConfig;
use crate::db::{
    EmailLogStore, HistoryStore, PgEmailLogStore, PgHistoryStore, PgSettingsStore,
    PgThresholdStore, SettingsStore, ThresholdStore,
};
use crate::services::{EmailService, Notifier};
use crate::shopify::{InventoryClient, ProductSource, ShopifyError};

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub checker: StockChecker,
    pub notifier: Notifier,
    pub thresholds: Arc<dyn ThresholdStore>,
    pub history: Arc<dyn HistoryStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub email_log: Arc<dyn EmailLogStore>,
}

impl AppState {
    /// Wire up stores, clients, and services from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Shopify client or SMTP transport cannot
    /// be constructed.
    pub fn new(config: &AppConfig, pool: PgPool) -> Result<Self, StateError> {
        let shop = config.shopify.store.clone();

        let thresholds: Arc<dyn ThresholdStore> =
            Arc::new(PgThresholdStore::new(pool.clone(), shop.clone()));
        let history: Arc<dyn HistoryStore> = Arc::new(PgHistoryStore::new(
            pool.clone(),
            shop.clone(),
            config.history_retention,
        ));
        let settings: Arc<dyn SettingsStore> =
            Arc::new(PgSettingsStore::new(pool.clone(), shop.clone()));
        let email_log: Arc<dyn EmailLogStore> =
            Arc::new(PgEmailLogStore::new(pool.clone(), shop));

        let source: Arc<dyn ProductSource> = Arc::new(InventoryClient::new(&config.shopify)?);

        let email = config
            .email
            .as_ref()
            .map(EmailService::new)
            .transpose()?;

        let checker = StockChecker::new(
            source,
            Arc::clone(&thresholds),
            Arc::clone(&history),
            config.fixture_policy,
        );

        let notifier = Notifier::new(
            email,
            Arc::clone(&settings),
            Arc::clone(&email_log),
            config.notification_email.clone(),
        );

        Ok(Self {
            pool,
            checker,
            notifier,
            thresholds,
            history,
            settings,
            email_log,
        })
    }
}

/// Startup wiring failures.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build Shopify client: {0}")]
    Shopify(#[from] ShopifyError),

    #[error("failed to build SMTP transport: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
