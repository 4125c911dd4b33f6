//! Wire types for the CMS metastore response
//!
//! Only the fields needed for change detection are modelled. Unknown fields
//! are ignored.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::warn;

use crate::app::models::CatalogEntry;
use crate::constants::catalog;
use crate::errors::{ManifestError, ManifestResult};

/// One dataset object as published by the metastore
#[derive(Debug, Deserialize)]
pub struct RawDataset {
    pub identifier: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub theme: RawThemes,
    pub modified: Option<String>,
    #[serde(default)]
    pub distribution: Vec<RawDistribution>,
}

/// Theme is normally a list; some snapshots carry a bare string
#[derive(Debug, Deserialize, Default)]
#[serde(untagged)]
pub enum RawThemes {
    Many(Vec<String>),
    One(String),
    #[default]
    None,
}

impl RawThemes {
    fn into_vec(self) -> Vec<String> {
        match self {
            RawThemes::Many(themes) => themes,
            RawThemes::One(theme) => vec![theme],
            RawThemes::None => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawDistribution {
    #[serde(rename = "downloadURL")]
    pub download_url: Option<String>,
}

impl RawDataset {
    /// Convert to a catalog entry, or explain which required field is missing
    pub fn into_entry(self) -> Result<CatalogEntry, &'static str> {
        let id = non_empty(self.identifier).ok_or("identifier")?;
        let version = non_empty(self.modified).ok_or("modified")?;
        let download_url = self
            .distribution
            .into_iter()
            .find_map(|d| non_empty(d.download_url))
            .ok_or("distribution[].downloadURL")?;

        Ok(CatalogEntry {
            title: self.title.unwrap_or_default(),
            themes: self.theme.into_vec(),
            id,
            download_url,
            version,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a manifest body into ordered catalog entries
///
/// Accepts a top-level array of dataset objects or an object holding that
/// array under `dataset`. Individual datasets missing a required field are
/// skipped with a warning, as is any later item repeating an identifier.
///
/// # Errors
///
/// Returns `ManifestError::JsonParse` for invalid JSON and
/// `ManifestError::UnexpectedFormat` for any other top-level shape
pub fn parse_manifest(bytes: &[u8]) -> ManifestResult<Vec<CatalogEntry>> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove(catalog::DATASET_KEY) {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(ManifestError::UnexpectedFormat {
                    reason: format!("object without a '{}' array", catalog::DATASET_KEY),
                })
            }
        },
        other => {
            return Err(ManifestError::UnexpectedFormat {
                reason: format!("top-level JSON {}", json_kind(&other)),
            })
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    let mut seen = HashSet::new();
    for (index, item) in items.into_iter().enumerate() {
        let raw: RawDataset = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping manifest item {}: {}", index, e);
                continue;
            }
        };
        match raw.into_entry() {
            Ok(entry) => {
                if seen.insert(entry.id.clone()) {
                    entries.push(entry);
                } else {
                    warn!("Skipping manifest item {}: duplicate identifier {}", index, entry.id);
                }
            }
            Err(field) => warn!("Skipping manifest item {}: missing {}", index, field),
        }
    }

    Ok(entries)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
