//! Stockwatch Core - Shared types library.
//!
//! This crate provides common types used across the Stockwatch components:
//! - `server` - Inventory-alerting service (HTTP API, scheduler)
//! - `cli` - Command-line tools for migrations and one-off checks
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no
//! HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Products, variants, thresholds, history entries, settings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
