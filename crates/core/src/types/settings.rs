//! Operator notification settings.

use serde::{Deserialize, Serialize};

/// The default threshold applied when no per-product override exists.
pub const DEFAULT_THRESHOLD: i64 = 5;

/// Notification settings for one shop.
///
/// A single logical row per deployment. Saves are an atomic upsert keyed
/// by the shop domain; concurrent writers race with last-write-wins,
/// which is acceptable for a single-operator tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Destination address for alert and report emails. When empty,
    /// senders may fall back to an environment-configured recipient.
    pub email: String,
    /// Suppress alert/report emails.
    pub disable_email: bool,
    /// Suppress recording sent alerts to the dashboard email inbox.
    pub disable_dashboard: bool,
    /// Default threshold for scheduled checks.
    pub default_threshold: i64,
    /// Whether the daily scheduled check runs at all.
    pub enable_auto_check: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: String::new(),
            disable_email: false,
            disable_dashboard: false,
            default_threshold: DEFAULT_THRESHOLD,
            enable_auto_check: true,
        }
    }
}
