//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (DB ping)
//!
//! # Checks
//! GET  /check-low-stock             - Run a low-stock check now
//!
//! # Catalog
//! GET  /api/products                - Fetched product catalog
//!
//! # Thresholds
//! GET  /api/custom-thresholds       - Current per-product overrides
//! POST /api/custom-thresholds       - Replace all overrides
//!
//! # Settings
//! GET  /api/settings                - Notification settings
//! POST /api/settings                - Upsert notification settings
//!
//! # Reports
//! GET  /api/history                 - Full retained check history
//! GET  /api/reports/{period}        - History entries for a period
//! POST /api/reports/{period}/send   - Email a summary report
//!
//! # Email inbox
//! GET  /api/emails                  - Logged alert emails
//! POST /api/emails/{id}/read        - Mark one email read
//! POST /api/emails/delete           - Delete a set of emails
//! ```

pub mod check;
pub mod emails;
pub mod health;
pub mod products;
pub mod reports;
pub mod settings;
pub mod thresholds;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .route("/check-low-stock", get(check::check_low_stock))
        .route("/api/products", get(products::list_products))
        .route(
            "/api/custom-thresholds",
            get(thresholds::get_thresholds).post(thresholds::replace_thresholds),
        )
        .route(
            "/api/settings",
            get(settings::get_settings).post(settings::save_settings),
        )
        .route("/api/history", get(reports::list_history))
        .route("/api/reports/{period}", get(reports::get_report))
        .route("/api/reports/{period}/send", post(reports::send_report))
        .route("/api/emails", get(emails::list_emails))
        .route("/api/emails/{id}/read", post(emails::mark_read))
        .route("/api/emails/delete", post(emails::delete_emails))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
