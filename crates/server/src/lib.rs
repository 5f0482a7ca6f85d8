//! Stockwatch server - low-stock monitoring for a Shopify store.
//!
//! # Architecture
//!
//! - Axum web framework serving a JSON API
//! - Shopify Admin REST API for catalog and inventory reads
//! - `PostgreSQL` for thresholds, settings, check history, and the
//!   dashboard email inbox
//! - lettre + Askama for alert and report emails
//! - tokio-cron-scheduler for the daily check and recurring reports

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checker;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
