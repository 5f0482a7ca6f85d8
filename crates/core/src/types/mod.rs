//! Core types for Stockwatch.
//!
//! This module provides type-safe wrappers for the inventory-alerting
//! domain: the product catalog snapshot, threshold overrides, check
//! history, and operator notification settings.

pub mod email;
pub mod history;
pub mod id;
pub mod product;
pub mod settings;
pub mod threshold;

pub use email::{Email, EmailError};
pub use history::{
    HistoryEntry, LowStockItem, ReportPeriod, ReportPeriodError, VariantStock,
    DEFAULT_HISTORY_RETENTION,
};
pub use id::*;
pub use product::{Product, Variant};
pub use settings::{NotificationSettings, DEFAULT_THRESHOLD};
pub use threshold::ThresholdMap;
