//! Catalog manifest retrieval and theme filtering
//!
//! The manifest is fetched in an explicit two-step sequence: the live
//! metastore first, then the local snapshot if the live attempt fails for any
//! reason. Only when both attempts fail is the run aborted.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hospital_fetcher::app::{filter_by_theme, CmsClient, ManifestConfig, ManifestFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(CmsClient::new()?);
//! let fetcher = ManifestFetcher::new(ManifestConfig::default(), client);
//! let manifest = fetcher.fetch_manifest().await?;
//! let hospitals = filter_by_theme(&manifest, "Hospitals");
//! println!("{} of {} datasets are hospital datasets", hospitals.len(), manifest.len());
//! # Ok(())
//! # }
//! ```

pub mod types;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::client::RemoteSource;
use crate::app::models::{CatalogEntry, Manifest, ManifestOrigin};
use crate::constants::{catalog, http};
use crate::errors::{ManifestError, ManifestResult};

pub use types::parse_manifest;

/// Where to look for the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Live metastore URL
    pub manifest_url: String,
    /// Local snapshot used when the live request fails
    pub fallback_path: PathBuf,
    /// Timeout for the live request
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Skip the live request entirely
    pub offline: bool,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            manifest_url: catalog::MANIFEST_URL.to_string(),
            fallback_path: PathBuf::from(catalog::FALLBACK_MANIFEST_FILE),
            timeout: http::MANIFEST_TIMEOUT,
            offline: false,
        }
    }
}

/// Retrieves the catalog manifest with local fallback
pub struct ManifestFetcher {
    config: ManifestConfig,
    source: Arc<dyn RemoteSource>,
}

impl ManifestFetcher {
    pub fn new(config: ManifestConfig, source: Arc<dyn RemoteSource>) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &ManifestConfig {
        &self.config
    }

    /// Fetch the manifest, preferring the network and falling back to the snapshot
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::Unavailable` only when both sources fail
    pub async fn fetch_manifest(&self) -> ManifestResult<Manifest> {
        let network_error = if self.config.offline {
            info!("Offline mode: skipping catalog request");
            "skipped (offline mode)".to_string()
        } else {
            info!("Fetching manifest from {}", self.config.manifest_url);
            match self.fetch_network().await {
                Ok(entries) => {
                    info!("Loaded {} catalog entries from network", entries.len());
                    return Ok(Manifest::new(entries, ManifestOrigin::Network));
                }
                Err(e) => {
                    warn!("Failed to fetch manifest from catalog: {}", e);
                    warn!(
                        "Falling back to local manifest {}",
                        self.config.fallback_path.display()
                    );
                    e.to_string()
                }
            }
        };

        match self.load_fallback().await {
            Ok(entries) => {
                info!("Loaded {} catalog entries from local fallback", entries.len());
                Ok(Manifest::new(entries, ManifestOrigin::Fallback))
            }
            Err(e) => Err(ManifestError::Unavailable {
                network: network_error,
                fallback: e.to_string(),
            }),
        }
    }

    async fn fetch_network(&self) -> ManifestResult<Vec<CatalogEntry>> {
        let body = self
            .source
            .get_bytes(&self.config.manifest_url, self.config.timeout)
            .await?;
        parse_manifest(&body)
    }

    async fn load_fallback(&self) -> ManifestResult<Vec<CatalogEntry>> {
        let path = &self.config.fallback_path;
        let body = tokio::fs::read(path)
            .await
            .map_err(|source| ManifestError::SnapshotRead {
                path: path.clone(),
                source,
            })?;
        parse_manifest(&body)
    }
}

/// Entries carrying `theme` as one of their tags, in manifest order
pub fn filter_by_theme(manifest: &Manifest, theme: &str) -> Vec<CatalogEntry> {
    manifest
        .entries
        .iter()
        .filter(|entry| entry.has_theme(theme))
        .cloned()
        .collect()
}
