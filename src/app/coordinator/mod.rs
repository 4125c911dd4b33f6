//! End-to-end run orchestration
//!
//! The coordinator runs one pipeline pass: fetch the manifest, keep the
//! entries carrying the requested theme, select those whose version differs
//! from the ledger, fetch them through the bounded pool, and commit the
//! successful results to the ledger in one write.
//!
//! Only the manifest (both sources failing) and the ledger (unreadable or
//! unwritable) can abort a run. Per-dataset problems show up as failures in
//! the returned [`RunReport`] and never reach the ledger.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hospital_fetcher::app::{
//!     CmsClient, Coordinator, DatasetStore, FetchPool, LedgerStore, ManifestConfig,
//!     ManifestFetcher, RunLog, RunOptions, WorkerConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(CmsClient::new()?);
//! let coordinator = Coordinator::new(
//!     ManifestFetcher::new(ManifestConfig::default(), client.clone()),
//!     LedgerStore::new("hospital_ledger.json"),
//!     FetchPool::new(
//!         WorkerConfig::default(),
//!         client,
//!         Arc::new(DatasetStore::new("hospital_download_data")),
//!     ),
//!     RunLog::for_current_process("run_log.txt"),
//! );
//!
//! let report = coordinator.run(&RunOptions::default(), None).await?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod stats;

#[cfg(test)]
mod tests;

use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::app::detector::{classify, DueReason};
use crate::app::ledger::LedgerStore;
use crate::app::manifest::{filter_by_theme, ManifestFetcher};
use crate::app::models::{CatalogEntry, FetchOutcome, FetchResult};
use crate::app::run_log::RunLog;
use crate::app::worker::{FetchPool, PoolEvent};
use crate::errors::Result;

pub use config::RunOptions;
pub use stats::{DueDataset, RunReport, RunSummary};

/// Runs the fetch pipeline end to end
pub struct Coordinator {
    manifest: ManifestFetcher,
    ledger: LedgerStore,
    pool: FetchPool,
    run_log: RunLog,
}

impl Coordinator {
    pub fn new(
        manifest: ManifestFetcher,
        ledger: LedgerStore,
        pool: FetchPool,
        run_log: RunLog,
    ) -> Self {
        Self {
            manifest,
            ledger,
            pool,
            run_log,
        }
    }

    /// Run the pipeline once
    ///
    /// # Errors
    ///
    /// Returns `AppError::Manifest` when neither manifest source is usable and
    /// `AppError::Ledger` when the ledger cannot be loaded or committed. An
    /// abort line is appended to the run log in both cases.
    pub async fn run(
        &self,
        options: &RunOptions,
        progress: Option<mpsc::Sender<PoolEvent>>,
    ) -> Result<RunReport> {
        if let Some(previous) = self.run_log.last_run_at().await {
            info!("Previous run recorded at {}", previous);
        }
        self.run_log
            .append(&format!(
                "Run started (theme: {}, force refresh: {}, dry run: {})",
                options.theme, options.force_refresh, options.dry_run
            ))
            .await;

        match self.execute(options, progress).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("Run aborted ({}): {}", e.category(), e);
                self.run_log.append(&format!("Run aborted: {}", e)).await;
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        options: &RunOptions,
        progress: Option<mpsc::Sender<PoolEvent>>,
    ) -> Result<RunReport> {
        let started = Instant::now();

        let manifest = self.manifest.fetch_manifest().await?;
        self.run_log
            .append(&format!(
                "Manifest loaded from {} ({} datasets)",
                manifest.origin,
                manifest.len()
            ))
            .await;

        let matched = filter_by_theme(&manifest, &options.theme);
        info!(
            "{} of {} datasets carry theme '{}'",
            matched.len(),
            manifest.len(),
            options.theme
        );

        let ledger = self.ledger.load().await?;

        let mut due = Vec::new();
        let mut due_entries: Vec<CatalogEntry> = Vec::new();
        for entry in &matched {
            let reason = classify(entry, &ledger, options.force_refresh);
            if reason == DueReason::Unchanged {
                continue;
            }
            info!("{} is due: {}", entry.id, reason);
            due.push(DueDataset {
                id: entry.id.clone(),
                title: entry.title.clone(),
                version: entry.version.clone(),
                reason,
            });
            due_entries.push(entry.clone());
        }
        let skipped_unchanged = matched.len() - due_entries.len();

        let mut report = RunReport {
            origin: manifest.origin,
            matched: matched.len(),
            due,
            results: Vec::new(),
            summary: RunSummary {
                skipped_unchanged,
                ..Default::default()
            },
            dry_run: options.dry_run,
            duration: started.elapsed(),
        };

        if options.dry_run {
            info!("Dry run: {} dataset(s) would be fetched", report.due.len());
            self.run_log
                .append(&format!(
                    "Dry run: {} of {} dataset(s) due",
                    report.due.len(),
                    report.matched
                ))
                .await;
            return Ok(report);
        }

        if due_entries.is_empty() {
            info!("All {} matching datasets are up to date", matched.len());
            self.run_log.append("Nothing to update").await;
            return Ok(report);
        }

        let mut results = self.pool.run(due_entries, progress).await;
        results.sort_by(|a, b| a.dataset_id.cmp(&b.dataset_id));
        for result in &results {
            self.run_log.append(&outcome_line(result)).await;
        }

        self.ledger.commit(ledger, &results).await?;

        report.summary = RunSummary::from_results(skipped_unchanged, &results);
        report.results = results;
        report.duration = started.elapsed();

        info!("{}", report.summary);
        self.run_log.append(&report.summary.to_string()).await;
        Ok(report)
    }
}

fn outcome_line(result: &FetchResult) -> String {
    match &result.outcome {
        FetchOutcome::Success { version, bytes, .. } => format!(
            "Fetched {} (version {}, {} bytes)",
            result.dataset_id, version, bytes
        ),
        FetchOutcome::Failure { reason } => {
            format!("Failed {}: {}", result.dataset_id, reason)
        }
    }
}
