//! Error types for Hospital Fetcher
//!
//! Errors are split by pipeline stage. Per-dataset errors (download,
//! normalization, storage) are contained at the fetch task boundary and only
//! ever surface as a failure reason string; manifest, ledger and configuration
//! errors abort the run.

use std::path::PathBuf;
use thiserror::Error;

/// Catalog manifest retrieval and parsing errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Network retrieval failed (transport, status or body)
    #[error("Manifest request failed: {0}")]
    Network(#[from] DownloadError),

    /// Local snapshot could not be read
    #[error("Failed to read local manifest snapshot {path}: {source}")]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("Manifest is not valid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// JSON parsed but the top level is neither a dataset list nor a `dataset` object
    #[error("Unexpected manifest format: {reason}")]
    UnexpectedFormat { reason: String },

    /// Both the network source and the local snapshot failed
    #[error("Manifest unavailable. Network: {network}. Fallback: {fallback}")]
    Unavailable { network: String, fallback: String },
}

/// Download and HTTP client errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Download timeout
    #[error("Download timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Resource not found
    #[error("Resource not found: {url}")]
    NotFound { url: String },

    /// Access forbidden
    #[error("Access forbidden: {url}")]
    Forbidden { url: String },

    /// Server returned error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Client configuration could not be turned into a working client
    #[error("Invalid client configuration: {0}")]
    ConfigurationError(String),
}

/// Header normalization errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    /// Payload is empty or its first record is blank
    #[error("Payload has no header row")]
    MissingHeader,

    /// Payload is not valid UTF-8
    #[error("Payload is not valid UTF-8 (byte offset {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },
}

/// Output file storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("File I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic rename failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },
}

/// Per-dataset fetch failure, reported through `FetchOutcome::Failure`
#[derive(Error, Debug)]
pub enum FetchError {
    /// Download failed
    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    /// Header normalization failed
    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    /// Writing the normalized file failed
    #[error("write failed: {0}")]
    Storage(#[from] StorageError),

    /// The whole task exceeded its deadline
    #[error("task exceeded deadline of {seconds} seconds")]
    Deadline { seconds: u64 },

    /// The worker running the task terminated before reporting
    #[error("worker terminated before reporting a result")]
    WorkerLost,
}

/// Ledger persistence errors
#[derive(Error, Debug)]
pub enum LedgerError {
    /// I/O error reading or writing the ledger
    #[error("Ledger I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Ledger file exists but cannot be interpreted
    #[error("Ledger file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Ledger could not be serialized
    #[error("Failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Temp-file persist failed
    #[error("Failed to replace ledger file {path}: {reason}")]
    Persist { path: PathBuf, reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error that can represent any fatal error
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Ledger error
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Download client error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Storage error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Manifest(_) => "manifest",
            AppError::Ledger(_) => "ledger",
            AppError::Download(_) => "download",
            AppError::Storage(_) => "storage",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }

    /// Whether this error stops a run before or during the pipeline
    ///
    /// Download, storage and I/O errors are normally contained per dataset;
    /// when one does reach the top level it is still reported, but it does
    /// not indicate broken configuration or state.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Manifest(_) | AppError::Ledger(_) | AppError::Config(_) | AppError::Generic { .. }
        )
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Manifest result type alias
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Normalization result type alias
pub type NormalizeResult<T> = std::result::Result<T, NormalizeError>;

/// Storage result type alias
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Ledger result type alias
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
