//! Core application logic for Hospital Fetcher
//!
//! This module contains the pipeline components: the HTTP client, catalog
//! manifest retrieval, change detection, the bounded fetch pool, header
//! normalization, output storage, the ledger and the coordinator that ties
//! them together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hospital_fetcher::app::{
//!     filter_by_theme, select_due, CmsClient, LedgerStore, ManifestConfig, ManifestFetcher,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(CmsClient::new()?);
//! let manifest = ManifestFetcher::new(ManifestConfig::default(), client)
//!     .fetch_manifest()
//!     .await?;
//!
//! let hospitals = filter_by_theme(&manifest, "Hospitals");
//! let ledger = LedgerStore::new("hospital_ledger.json").load().await?;
//! for entry in select_due(&hospitals, &ledger, false) {
//!     println!("{} needs fetching (version {})", entry.id, entry.version);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod coordinator;
pub mod detector;
pub mod ledger;
pub mod manifest;
pub mod models;
pub mod normalize;
pub mod run_log;
pub mod storage;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main public API
pub use client::{ClientConfig, CmsClient, RemoteSource};
pub use coordinator::{Coordinator, DueDataset, RunOptions, RunReport, RunSummary};
pub use detector::{classify, select_due, DueReason};
pub use ledger::{Ledger, LedgerRecord, LedgerStore};
pub use manifest::{filter_by_theme, parse_manifest, ManifestConfig, ManifestFetcher};
pub use models::{CatalogEntry, FetchOutcome, FetchResult, Manifest, ManifestOrigin};
pub use normalize::{normalize, to_snake_case};
pub use run_log::RunLog;
pub use storage::DatasetStore;
pub use worker::{FetchPool, PoolEvent, WorkerConfig};
