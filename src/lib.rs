//! Hospital Fetcher Library
//!
//! Incremental synchronization of the hospital datasets published in the CMS
//! Provider Data Catalog. Only datasets whose catalog version changed since
//! the last successful run are downloaded; their CSV headers are rewritten to
//! snake_case and the new versions are recorded in a durable ledger.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
