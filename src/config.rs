//! Configuration management for Hospital Fetcher
//!
//! Settings come from, in increasing precedence: built-in defaults, a TOML
//! file, `HOSPITAL_FETCHER_*` environment variables, and command line flags
//! (applied by the CLI). Every section is optional and every key inside a
//! section falls back to its default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, ManifestConfig, WorkerConfig};
use crate::constants::{catalog, env, files, http, limits, logging, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog source and filtering
    pub catalog: CatalogConfigToml,
    /// Output, ledger and run log locations
    pub storage: StorageConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Fetch pool settings
    pub workers: WorkerConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly catalog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfigToml {
    /// Metastore URL listing every dataset
    pub manifest_url: String,
    /// Local manifest snapshot used when the catalog is unreachable
    pub fallback_manifest: PathBuf,
    /// Theme tag selecting datasets
    pub theme: String,
    /// Never contact the catalog; use the snapshot only
    pub offline: bool,
}

impl Default for CatalogConfigToml {
    fn default() -> Self {
        Self {
            manifest_url: catalog::MANIFEST_URL.to_string(),
            fallback_manifest: PathBuf::from(catalog::FALLBACK_MANIFEST_FILE),
            theme: catalog::DEFAULT_THEME.to_string(),
            offline: false,
        }
    }
}

/// TOML-friendly storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfigToml {
    /// Directory receiving normalized CSV files
    pub output_dir: PathBuf,
    /// Ledger file path
    pub ledger_file: PathBuf,
    /// Run log file path
    pub run_log_file: PathBuf,
}

impl Default for StorageConfigToml {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(files::OUTPUT_DIR),
            ledger_file: PathBuf::from(files::LEDGER_FILE),
            run_log_file: PathBuf::from(files::RUN_LOG_FILE),
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Timeout for each dataset download
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Timeout for the catalog manifest request
    #[serde(with = "humantime_serde")]
    pub manifest_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Requests per second across all workers
    pub rate_limit_rps: u32,
    pub user_agent: String,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            manifest_timeout: http::MANIFEST_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            user_agent: http::USER_AGENT.to_string(),
        }
    }
}

/// TOML-friendly fetch pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfigToml {
    /// Maximum concurrent fetch tasks
    pub worker_count: usize,
    /// Deadline for one whole fetch task
    #[serde(with = "humantime_serde")]
    pub task_timeout: Duration,
}

impl Default for WorkerConfigToml {
    fn default() -> Self {
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            task_timeout: workers::DEFAULT_TASK_TIMEOUT,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: logging::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the first file found, then apply environment overrides
    ///
    /// An explicitly given file must exist; the standard locations are
    /// optional.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Self::load_from_file(&path).await?
            }
            None => match Self::find_config_file() {
                Some(path) => Self::load_from_file(&path).await?,
                None => {
                    debug!("No config file found in standard locations; using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `HOSPITAL_FETCHER_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(env::MANIFEST_URL).filter(|v| !v.trim().is_empty()) {
            debug!("Manifest URL overridden by {}", env::MANIFEST_URL);
            self.catalog.manifest_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(env::WORKERS) {
            self.workers.worker_count =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: env::WORKERS.to_string(),
                        value: raw.clone(),
                        reason: "Expected a positive integer".to_string(),
                    })?;
            debug!("Worker count overridden by {}", env::WORKERS);
        }

        Ok(())
    }

    /// Check every section for values the pipeline cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.catalog.theme.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "catalog.theme".to_string(),
                value: self.catalog.theme.clone(),
                reason: "Theme must not be empty".to_string(),
            });
        }

        if self.client.manifest_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "client.manifest_timeout".to_string(),
                value: "0s".to_string(),
                reason: "Must be greater than zero".to_string(),
            });
        }

        self.client_config()
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                field: "client".to_string(),
                value: format!("{:?}", self.client),
                reason: e.to_string(),
            })?;

        self.worker_config().validate()
    }

    /// Runtime configuration for the manifest fetcher
    pub fn manifest_config(&self) -> ManifestConfig {
        ManifestConfig {
            manifest_url: self.catalog.manifest_url.clone(),
            fallback_path: self.catalog.fallback_manifest.clone(),
            timeout: self.client.manifest_timeout,
            offline: self.catalog.offline,
        }
    }

    /// Runtime configuration for the HTTP client
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.client.request_timeout,
            connect_timeout: self.client.connect_timeout,
            rate_limit_rps: self.client.rate_limit_rps,
            user_agent: self.client.user_agent.clone(),
            ..ClientConfig::default()
        }
    }

    /// Runtime configuration for the fetch pool
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            worker_count: self.workers.worker_count,
            download_timeout: self.client.request_timeout,
            task_timeout: self.workers.task_timeout,
            ..WorkerConfig::default()
        }
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(files::CONFIG_FILE_NAME)];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        search_paths.into_iter().find(|path| {
            let found = path.exists();
            if found {
                debug!("Found config file: {}", path.display());
            }
            found
        })
    }

    /// Default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }
}
