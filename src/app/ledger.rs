//! Durable change-tracking ledger
//!
//! The ledger maps dataset id to the last version marker that was fetched and
//! normalized successfully. It is loaded once at the start of a run, changed
//! only in memory, and written back once after the fetch pool has drained.
//! Writes go to a temporary file in the ledger's directory which then replaces
//! the ledger, so a crash never leaves a half-written file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::app::models::{FetchOutcome, FetchResult};
use crate::errors::{LedgerError, LedgerResult};

/// Last successful fetch of one dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Version marker that was fetched
    pub version: String,
    /// When that fetch was committed
    pub recorded_at: DateTime<Utc>,
    /// Where the normalized file was written
    pub path: PathBuf,
    /// MD5 of the normalized file
    pub content_md5: String,
    /// Size of the normalized file
    pub bytes: u64,
}

/// Dataset id to last successful record, kept sorted by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    records: BTreeMap<String, LedgerRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dataset_id: &str) -> Option<&LedgerRecord> {
        self.records.get(dataset_id)
    }

    /// Recorded version marker for `dataset_id`
    pub fn version_of(&self, dataset_id: &str) -> Option<&str> {
        self.records.get(dataset_id).map(|r| r.version.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LedgerRecord)> {
        self.records.iter()
    }

    /// Insert or replace the record for `dataset_id`
    pub fn upsert(&mut self, dataset_id: impl Into<String>, record: LedgerRecord) {
        self.records.insert(dataset_id.into(), record);
    }

    /// Merge fetch results into the ledger
    ///
    /// Results are applied in dataset id order so the outcome depends only on
    /// the set of results, not on the order the pool finished them in. Every
    /// success shares the one `recorded_at` timestamp. Failures are skipped,
    /// leaving any existing record untouched.
    ///
    /// Returns the number of records written.
    pub fn apply(&mut self, results: &[FetchResult], recorded_at: DateTime<Utc>) -> usize {
        let mut ordered: Vec<&FetchResult> = results.iter().collect();
        ordered.sort_by(|a, b| a.dataset_id.cmp(&b.dataset_id));

        let mut updated = 0;
        for result in ordered {
            match &result.outcome {
                FetchOutcome::Success {
                    path,
                    version,
                    content_md5,
                    bytes,
                } => {
                    self.upsert(
                        result.dataset_id.clone(),
                        LedgerRecord {
                            version: version.clone(),
                            recorded_at,
                            path: path.clone(),
                            content_md5: content_md5.clone(),
                            bytes: *bytes,
                        },
                    );
                    updated += 1;
                }
                FetchOutcome::Failure { reason } => {
                    debug!(
                        "Ledger keeps prior state for {}: {}",
                        result.dataset_id, reason
                    );
                }
            }
        }
        updated
    }
}

/// File-backed persistence for the ledger
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ledger from disk
    ///
    /// A missing file or a file containing only whitespace is an empty
    /// ledger.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Io` if the file exists but cannot be read and
    /// `LedgerError::Corrupt` if its content is not a ledger
    pub async fn load(&self) -> LedgerResult<Ledger> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No ledger at {}; treating every dataset as new",
                    self.path.display()
                );
                return Ok(Ledger::new());
            }
            Err(source) => {
                return Err(LedgerError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            warn!(
                "Ledger {} is empty; treating every dataset as new",
                self.path.display()
            );
            return Ok(Ledger::new());
        }

        let ledger: Ledger =
            serde_json::from_str(&content).map_err(|e| LedgerError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        debug!("Loaded {} ledger records", ledger.len());
        Ok(ledger)
    }

    /// Write the ledger atomically
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if serialization, the temp file write or the
    /// final rename fails
    pub async fn save(&self, ledger: &Ledger) -> LedgerResult<()> {
        let mut content = serde_json::to_vec_pretty(ledger)?;
        content.push(b'\n');

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &content))
            .await
            .map_err(|e| LedgerError::Persist {
                path: self.path.clone(),
                reason: e.to_string(),
            })?
    }

    /// Merge `results` into `ledger` and persist it once
    ///
    /// Nothing is written when no result succeeded, so a run that changed
    /// nothing leaves the ledger file untouched.
    pub async fn commit(&self, ledger: Ledger, results: &[FetchResult]) -> LedgerResult<Ledger> {
        self.commit_at(ledger, results, Utc::now()).await
    }

    /// [`commit`](Self::commit) with an explicit timestamp
    pub async fn commit_at(
        &self,
        mut ledger: Ledger,
        results: &[FetchResult],
        recorded_at: DateTime<Utc>,
    ) -> LedgerResult<Ledger> {
        let updated = ledger.apply(results, recorded_at);
        if updated == 0 {
            debug!("No successful fetches; ledger left unchanged");
            return Ok(ledger);
        }

        self.save(&ledger).await?;
        info!(
            "Committed {} ledger record(s) to {}",
            updated,
            self.path.display()
        );
        Ok(ledger)
    }
}

fn write_atomic(path: &Path, content: &[u8]) -> LedgerResult<()> {
    use std::io::Write;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let io_err = |source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(&parent).map_err(io_err)?;
    let mut temp = tempfile::Builder::new()
        .prefix(".ledger")
        .tempfile_in(&parent)
        .map_err(io_err)?;
    temp.write_all(content).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| LedgerError::Persist {
        path: path.to_path_buf(),
        reason: e.error.to_string(),
    })?;
    Ok(())
}
