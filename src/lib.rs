//! # Caddie Library
//!
//! This library provides the core functionality for the caddie scraping
//! service, including source fetchers, entity reconciliation, and the
//! scheduled scrape engine.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod reconcile;
pub mod repositories;
pub mod run_log;
pub mod scheduler;
pub mod service;
pub mod session;
pub mod sources;
pub use migration;
