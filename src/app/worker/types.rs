//! Worker type definitions
//!
//! Progress events sent from workers to an optional observer, and the
//! per-worker tallies returned when a worker exits.

use serde::{Deserialize, Serialize};

/// Progress event emitted by the fetch pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolEvent {
    /// The pool accepted `total` datasets
    Planned { total: usize },
    /// A worker picked up a dataset
    Started { worker_id: u32, dataset_id: String },
    /// A worker reached a terminal result for a dataset
    Finished {
        worker_id: u32,
        dataset_id: String,
        success: bool,
    },
}

impl PoolEvent {
    pub fn dataset_id(&self) -> Option<&str> {
        match self {
            PoolEvent::Planned { .. } => None,
            PoolEvent::Started { dataset_id, .. } | PoolEvent::Finished { dataset_id, .. } => {
                Some(dataset_id)
            }
        }
    }
}

/// What one worker did before the queue ran dry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl WorkerStats {
    pub fn record(&mut self, success: bool) {
        self.processed += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Fold another worker's tallies into this one
    pub fn merge(&mut self, other: &WorkerStats) {
        self.processed += other.processed;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}
