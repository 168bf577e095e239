//! FormFlow Sync Library
//!
//! This module exports the core components for testing and integration.

pub mod aggregation;
pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod sync;
pub mod types;
pub mod wizard;
