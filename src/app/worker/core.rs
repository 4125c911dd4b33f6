//! Core fetch worker implementation
//!
//! A worker repeatedly takes the next catalog entry off the shared queue and
//! runs it through download, header normalization and storage. Every failure
//! is turned into a `FetchResult::failure` at the task boundary, so one bad
//! dataset never stops the worker or its siblings. The worker exits when the
//! queue is empty.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use super::config::WorkerConfig;
use super::types::{PoolEvent, WorkerStats};
use crate::app::client::RemoteSource;
use crate::app::models::{CatalogEntry, FetchResult};
use crate::app::normalize::normalize;
use crate::app::storage::DatasetStore;
use crate::errors::FetchError;

/// Queue shared by all workers of one pool run
pub type SharedQueue = Arc<Mutex<VecDeque<CatalogEntry>>>;

/// Normalized file produced by one successful task
struct Stored {
    path: PathBuf,
    content_md5: String,
    bytes: u64,
}

/// Individual fetch worker
pub struct FetchWorker {
    id: u32,
    config: WorkerConfig,
    queue: SharedQueue,
    source: Arc<dyn RemoteSource>,
    store: Arc<DatasetStore>,
    results_tx: mpsc::Sender<FetchResult>,
    progress_tx: Option<mpsc::Sender<PoolEvent>>,
}

impl FetchWorker {
    pub fn new(
        id: u32,
        config: WorkerConfig,
        queue: SharedQueue,
        source: Arc<dyn RemoteSource>,
        store: Arc<DatasetStore>,
        results_tx: mpsc::Sender<FetchResult>,
        progress_tx: Option<mpsc::Sender<PoolEvent>>,
    ) -> Self {
        Self {
            id,
            config,
            queue,
            source,
            store,
            results_tx,
            progress_tx,
        }
    }

    /// Drain the queue, reporting one result per entry taken
    pub async fn run(self) -> WorkerStats {
        debug!("Worker {} starting", self.id);
        let mut stats = WorkerStats::default();

        while let Some(entry) = self.next_entry().await {
            self.report(PoolEvent::Started {
                worker_id: self.id,
                dataset_id: entry.id.clone(),
            });

            let result = self.process(&entry).await;
            let success = result.is_success();
            stats.record(success);

            if self.results_tx.send(result).await.is_err() {
                warn!("Worker {}: result receiver dropped, stopping", self.id);
                break;
            }

            self.report(PoolEvent::Finished {
                worker_id: self.id,
                dataset_id: entry.id.clone(),
                success,
            });
        }

        debug!(
            "Worker {} finished: {} processed, {} failed",
            self.id, stats.processed, stats.failed
        );
        stats
    }

    async fn next_entry(&self) -> Option<CatalogEntry> {
        self.queue.lock().await.pop_front()
    }

    /// Run one entry to a terminal result within the task deadline
    pub async fn process(&self, entry: &CatalogEntry) -> FetchResult {
        let deadline = self.config.task_timeout;
        let outcome = match tokio::time::timeout(deadline, self.fetch(entry)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                // The write may have been cut off between create and rename
                self.store.discard_partial(&entry.id).await;
                Err(FetchError::Deadline {
                    seconds: deadline.as_secs(),
                })
            }
        };

        match outcome {
            Ok(stored) => {
                info!(
                    "Fetched {} ({} bytes) -> {}",
                    entry.id,
                    stored.bytes,
                    stored.path.display()
                );
                FetchResult::success(
                    entry.id.clone(),
                    stored.path,
                    entry.version.clone(),
                    stored.content_md5,
                    stored.bytes,
                )
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", entry.id, e);
                FetchResult::failure(entry.id.clone(), e.to_string())
            }
        }
    }

    async fn fetch(&self, entry: &CatalogEntry) -> Result<Stored, FetchError> {
        debug!("Worker {} downloading {}", self.id, entry.download_url);
        let raw = self
            .source
            .get_bytes(&entry.download_url, self.config.download_timeout)
            .await?;

        let normalized = normalize(&raw)?;
        let content_md5 = format!("{:x}", md5::compute(&normalized));
        let path = self.store.write_atomic(&entry.id, &normalized).await?;

        Ok(Stored {
            path,
            content_md5,
            bytes: normalized.len() as u64,
        })
    }

    fn report(&self, event: PoolEvent) {
        if let Some(tx) = &self.progress_tx {
            // Progress is best effort; a slow observer must not stall fetching
            if let Err(e) = tx.try_send(event) {
                debug!("Worker {}: dropped progress event: {}", self.id, e);
            }
        }
    }
}
