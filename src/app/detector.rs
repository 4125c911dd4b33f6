//! Change detection against the ledger
//!
//! Pure functions: the ledger is only read here, never modified.

use std::fmt;

use crate::app::ledger::Ledger;
use crate::app::models::CatalogEntry;

/// Why a catalog entry is, or is not, due for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueReason {
    /// Force-refresh is active
    Forced,
    /// No ledger record exists for the dataset
    New,
    /// The catalog version differs from the recorded one
    Changed { previous: String },
    /// The catalog version equals the recorded one
    Unchanged,
}

impl DueReason {
    pub fn is_due(&self) -> bool {
        !matches!(self, DueReason::Unchanged)
    }
}

impl fmt::Display for DueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueReason::Forced => write!(f, "forced refresh"),
            DueReason::New => write!(f, "new dataset"),
            DueReason::Changed { previous } => write!(f, "changed since {}", previous),
            DueReason::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Classify one entry against the ledger
pub fn classify(entry: &CatalogEntry, ledger: &Ledger, force: bool) -> DueReason {
    if force {
        return DueReason::Forced;
    }
    match ledger.version_of(&entry.id) {
        None => DueReason::New,
        Some(recorded) if recorded == entry.version => DueReason::Unchanged,
        Some(recorded) => DueReason::Changed {
            previous: recorded.to_string(),
        },
    }
}

/// Entries that need fetching, in input order
pub fn select_due(entries: &[CatalogEntry], ledger: &Ledger, force: bool) -> Vec<CatalogEntry> {
    entries
        .iter()
        .filter(|entry| classify(entry, ledger, force).is_due())
        .cloned()
        .collect()
}
