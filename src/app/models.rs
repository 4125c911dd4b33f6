//! Core data models for the fetch pipeline
//!
//! Catalog entries and manifests are rebuilt from scratch every run; fetch
//! results carry the per-dataset outcome from the pool to the ledger writer.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One dataset published in the catalog manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stable dataset identifier (e.g. `xubh-q36u`)
    pub id: String,
    /// Human readable title
    pub title: String,
    /// Theme tags as published by the catalog
    pub themes: Vec<String>,
    /// Direct download URL of the tabular distribution
    pub download_url: String,
    /// Opaque version marker (the catalog's `modified` value)
    pub version: String,
}

impl CatalogEntry {
    /// Create a new catalog entry
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        themes: Vec<String>,
        download_url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            themes,
            download_url: download_url.into(),
            version: version.into(),
        }
    }

    /// Whether one of the entry's theme tags equals `theme` exactly
    pub fn has_theme(&self, theme: &str) -> bool {
        self.themes.iter().any(|t| t == theme)
    }
}

/// Where the manifest for this run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestOrigin {
    /// Live catalog response
    Network,
    /// Local snapshot file
    Fallback,
}

impl fmt::Display for ManifestOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestOrigin::Network => write!(f, "network"),
            ManifestOrigin::Fallback => write!(f, "local fallback"),
        }
    }
}

/// Ordered catalog enumeration from exactly one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub entries: Vec<CatalogEntry>,
    pub origin: ManifestOrigin,
}

impl Manifest {
    pub fn new(entries: Vec<CatalogEntry>, origin: ManifestOrigin) -> Self {
        Self { entries, origin }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Terminal state of one fetch task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    /// Downloaded, normalized and written
    Success {
        /// Where the normalized file was stored
        path: PathBuf,
        /// Version marker to commit to the ledger
        version: String,
        /// MD5 of the normalized bytes
        content_md5: String,
        /// Size of the normalized file
        bytes: u64,
    },
    /// Any stage failed; the ledger must not change for this dataset
    Failure { reason: String },
}

/// Per-dataset result reported by the fetch pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub dataset_id: String,
    pub outcome: FetchOutcome,
}

impl FetchResult {
    pub fn success(
        dataset_id: impl Into<String>,
        path: PathBuf,
        version: impl Into<String>,
        content_md5: impl Into<String>,
        bytes: u64,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            outcome: FetchOutcome::Success {
                path,
                version: version.into(),
                content_md5: content_md5.into(),
                bytes,
            },
        }
    }

    pub fn failure(dataset_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            outcome: FetchOutcome::Failure {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Success { .. })
    }

    /// Failure reason, if this result is a failure
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Failure { reason } => Some(reason),
            FetchOutcome::Success { .. } => None,
        }
    }
}
