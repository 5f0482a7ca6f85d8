//! One-off low-stock check command.
//!
//! Runs the same pipeline the server uses for its scheduled checks and
//! prints the outcome as JSON. Notifications are NOT dispatched; this
//! is a read-and-record tool.

use serde_json::json;
use thiserror::Error;

use stockwatch_server::checker::CheckError;
use stockwatch_server::config::{AppConfig, ConfigError};
use stockwatch_server::db;
use stockwatch_server::state::{AppState, StateError};

/// Errors that can occur while running a check from the CLI.
#[derive(Debug, Error)]
pub enum CheckCommandError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("startup error: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run one check and print the result.
///
/// # Errors
///
/// Returns an error if configuration, the database, or the catalog
/// fetch fails.
#[allow(clippy::print_stdout)]
pub async fn run(threshold: Option<i64>) -> Result<(), CheckCommandError> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    let state = AppState::new(&config, pool)?;

    let threshold = match threshold {
        Some(threshold) => threshold,
        None => state.notifier.settings().await.default_threshold,
    };

    tracing::info!(threshold, "running low-stock check");
    let outcome = state.checker.check_low_stock(threshold).await?;

    let output = json!({
        "threshold": threshold,
        "item_count": outcome.entry.item_count,
        "items": outcome.entry.items,
        "used_fixtures": outcome.used_fixtures,
        "history_recorded": outcome.history_recorded,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
