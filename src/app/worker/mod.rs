//! Concurrent fetch pool
//!
//! A fixed set of tokio worker tasks drains a shared queue of due catalog
//! entries. Each task downloads one dataset, normalizes its header and writes
//! it to the dataset store. The number of concurrent tasks never exceeds the
//! configured worker count, and every entry ends with exactly one
//! [`FetchResult`](crate::app::models::FetchResult).
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hospital_fetcher::app::worker::{FetchPool, WorkerConfig};
//! use hospital_fetcher::app::{CmsClient, DatasetStore};
//!
//! # async fn example(entries: Vec<hospital_fetcher::app::CatalogEntry>) -> Result<(), Box<dyn std::error::Error>> {
//! let pool = FetchPool::new(
//!     WorkerConfig::default(),
//!     Arc::new(CmsClient::new()?),
//!     Arc::new(DatasetStore::new("hospital_download_data")),
//! );
//! let results = pool.run(entries, None).await;
//! println!("{} results", results.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod pool;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::WorkerConfig;
pub use self::core::FetchWorker;
pub use pool::FetchPool;
pub use types::{PoolEvent, WorkerStats};
