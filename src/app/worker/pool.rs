//! Bounded fetch pool
//!
//! The pool owns the only concurrency in a run. Entries go into one shared
//! queue drained by `min(worker_count, entries)` tokio tasks; results come
//! back over an mpsc channel. `run` returns only once every entry has a
//! terminal result, including entries whose worker died before reporting.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use super::config::WorkerConfig;
use super::core::FetchWorker;
use super::types::{PoolEvent, WorkerStats};
use crate::app::client::RemoteSource;
use crate::app::models::{CatalogEntry, FetchResult};
use crate::app::storage::DatasetStore;
use crate::errors::FetchError;

/// Pool of fetch workers sharing one source and one output store
pub struct FetchPool {
    config: WorkerConfig,
    source: Arc<dyn RemoteSource>,
    store: Arc<DatasetStore>,
}

impl FetchPool {
    pub fn new(
        config: WorkerConfig,
        source: Arc<dyn RemoteSource>,
        store: Arc<DatasetStore>,
    ) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Fetch every entry and return one result per distinct dataset id
    ///
    /// Result order is arbitrary. Progress events are sent to `progress` when
    /// given; a full or closed progress channel never blocks fetching.
    pub async fn run(
        &self,
        entries: Vec<CatalogEntry>,
        progress: Option<mpsc::Sender<PoolEvent>>,
    ) -> Vec<FetchResult> {
        if entries.is_empty() {
            debug!("Nothing to fetch");
            return Vec::new();
        }

        let expected: Vec<String> = entries.iter().map(|e| e.id.clone()).collect();
        let worker_count = self.config.worker_count.min(entries.len()).max(1);
        info!(
            "Fetching {} datasets with {} workers",
            entries.len(),
            worker_count
        );

        if let Some(tx) = &progress {
            let _ = tx.try_send(PoolEvent::Planned {
                total: entries.len(),
            });
        }

        let queue = Arc::new(Mutex::new(VecDeque::from(entries)));
        let (results_tx, mut results_rx) = mpsc::channel(expected.len());

        let handles: Vec<_> = (0..worker_count)
            .map(|worker_id| {
                let worker = FetchWorker::new(
                    worker_id as u32,
                    self.config.clone(),
                    queue.clone(),
                    self.source.clone(),
                    self.store.clone(),
                    results_tx.clone(),
                    progress.clone(),
                );
                tokio::spawn(worker.run())
            })
            .collect();
        drop(results_tx);

        let mut totals = WorkerStats::default();
        for (worker_id, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(stats) => totals.merge(&stats),
                Err(e) => error!("Worker {} terminated abnormally: {}", worker_id, e),
            }
        }

        let mut results = Vec::with_capacity(expected.len());
        while let Some(result) = results_rx.recv().await {
            results.push(result);
        }

        let reported: HashSet<String> = results.iter().map(|r| r.dataset_id.clone()).collect();
        let mut lost = HashSet::new();
        for id in expected {
            if !reported.contains(&id) && lost.insert(id.clone()) {
                error!("No result reported for {}", id);
                results.push(FetchResult::failure(id, FetchError::WorkerLost.to_string()));
            }
        }

        info!(
            "Fetch pool drained: {} succeeded, {} failed",
            results.iter().filter(|r| r.is_success()).count(),
            results.iter().filter(|r| !r.is_success()).count()
        );
        debug!(
            "Worker totals: {} processed, {} succeeded, {} failed",
            totals.processed, totals.succeeded, totals.failed
        );
        results
    }
}
