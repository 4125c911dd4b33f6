//! Application constants for Hospital Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides `[catalog] manifest_url`
    pub const MANIFEST_URL: &str = "HOSPITAL_FETCHER_MANIFEST_URL";

    /// Overrides `[workers] worker_count`
    pub const WORKERS: &str = "HOSPITAL_FETCHER_WORKERS";
}

/// CMS Provider Data Catalog endpoints and defaults
pub mod catalog {
    /// Metastore listing of every published dataset
    pub const MANIFEST_URL: &str =
        "https://data.cms.gov/provider-data/api/1/metastore/schemas/dataset/items";

    /// Local snapshot consulted when the metastore cannot be reached
    pub const FALLBACK_MANIFEST_FILE: &str = "CMS_BU_DATA.json";

    /// Theme tag selecting hospital datasets
    pub const DEFAULT_THEME: &str = "Hospitals";

    /// Key wrapping the dataset list in object-shaped manifests
    pub const DATASET_KEY: &str = "dataset";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Hospital-Fetcher/0.1.0 (CMS open data sync)";

    /// Timeout for the manifest request
    pub const MANIFEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default HTTP request timeout for dataset downloads
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Rate limiting configuration
pub mod limits {
    /// Default rate limit for CMS requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;
}

/// File and storage defaults
pub mod files {
    /// Directory receiving normalized dataset files
    pub const OUTPUT_DIR: &str = "hospital_download_data";

    /// Change-tracking ledger
    pub const LEDGER_FILE: &str = "hospital_ledger.json";

    /// Append-only run log
    pub const RUN_LOG_FILE: &str = "run_log.txt";

    /// Extension of stored dataset files
    pub const DATASET_EXTENSION: &str = "csv";

    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Project-local configuration file name
    pub const CONFIG_FILE_NAME: &str = "hospital-fetcher.toml";

    /// Directory under the user config dir
    pub const CONFIG_DIR_NAME: &str = "hospital-fetcher";
}

/// Worker and concurrency configuration
pub mod workers {
    use super::Duration;

    /// Default number of fetch workers
    pub const DEFAULT_WORKER_COUNT: usize = 5;

    /// Upper bound on concurrent workers
    pub const MAX_WORKER_COUNT: usize = 32;

    /// Deadline for one download + normalize + write task
    pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(300);

    /// Buffer size for pool progress events
    pub const PROGRESS_BUFFER_SIZE: usize = 64;
}

/// Logging defaults
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

// Re-export commonly used constants for convenience
pub use catalog::{DEFAULT_THEME, MANIFEST_URL};
pub use http::USER_AGENT;
pub use limits::DEFAULT_RATE_LIMIT_RPS;
pub use workers::DEFAULT_WORKER_COUNT;
