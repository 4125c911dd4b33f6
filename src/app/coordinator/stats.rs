//! Run summary and report types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::detector::DueReason;
use crate::app::models::{FetchResult, ManifestOrigin};

/// Counts reported at the end of every run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub skipped_unchanged: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_results(skipped_unchanged: usize, results: &[FetchResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            skipped_unchanged,
            succeeded,
            failed: results.len() - succeeded,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downloaded {} file(s), {} failed, {} unchanged",
            self.succeeded, self.failed, self.skipped_unchanged
        )
    }
}

/// A dataset selected for fetching and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueDataset {
    pub id: String,
    pub title: String,
    pub version: String,
    pub reason: DueReason,
}

/// Everything a finished run reports back to its caller
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Where the manifest came from
    pub origin: ManifestOrigin,
    /// Entries carrying the requested theme
    pub matched: usize,
    /// Entries selected for fetching, in manifest order
    pub due: Vec<DueDataset>,
    /// One result per fetched dataset, sorted by id; empty for dry runs
    pub results: Vec<FetchResult>,
    pub summary: RunSummary,
    pub dry_run: bool,
    pub duration: Duration,
}

impl RunReport {
    /// Whether any dataset failed
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}
