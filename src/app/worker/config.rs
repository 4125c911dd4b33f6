//! Fetch pool configuration
//!
//! Worker count, per-request timeout and whole-task deadline for the fetch
//! pool, with validation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{http, workers};
use crate::errors::{ConfigError, ConfigResult};

/// Configuration for the fetch pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Upper bound on concurrently running fetch tasks
    pub worker_count: usize,
    /// Timeout for the dataset download request
    #[serde(with = "humantime_serde")]
    pub download_timeout: Duration,
    /// Deadline for one whole task (download, normalize, write)
    #[serde(with = "humantime_serde")]
    pub task_timeout: Duration,
    /// Channel buffer size for progress events
    pub progress_buffer_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: workers::DEFAULT_WORKER_COUNT,
            download_timeout: http::DEFAULT_TIMEOUT,
            task_timeout: workers::DEFAULT_TASK_TIMEOUT,
            progress_buffer_size: workers::PROGRESS_BUFFER_SIZE,
        }
    }
}

impl WorkerConfig {
    /// Validate configuration values and return errors for invalid settings
    pub fn validate(&self) -> ConfigResult<()> {
        if self.worker_count == 0 || self.worker_count > workers::MAX_WORKER_COUNT {
            return Err(invalid(
                "workers.worker_count",
                self.worker_count,
                format!("Must be between 1 and {}", workers::MAX_WORKER_COUNT),
            ));
        }

        if self.download_timeout.is_zero() {
            return Err(invalid(
                "workers.download_timeout",
                "0s",
                "Must be greater than zero",
            ));
        }

        if self.task_timeout.is_zero() {
            return Err(invalid(
                "workers.task_timeout",
                "0s",
                "Must be greater than zero",
            ));
        }

        if self.progress_buffer_size == 0 {
            return Err(invalid(
                "workers.progress_buffer_size",
                0,
                "Must be greater than zero",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test WorkerConfig default values match constants
    #[test]
    fn test_worker_config_default() {
        let config = WorkerConfig::default();
        assert_eq!(config.worker_count, workers::DEFAULT_WORKER_COUNT);
        assert_eq!(config.task_timeout, workers::DEFAULT_TASK_TIMEOUT);
        assert_eq!(config.download_timeout, http::DEFAULT_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    /// Test configuration validation catches invalid values
    ///
    /// Worker counts outside 1..=MAX and zero durations are rejected.
    #[test]
    fn test_config_validation() {
        let config = WorkerConfig {
            worker_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WorkerConfig {
            worker_count: workers::MAX_WORKER_COUNT + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WorkerConfig {
            worker_count: workers::MAX_WORKER_COUNT,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = WorkerConfig {
            task_timeout: Duration::ZERO,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "workers.task_timeout")
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_durations_deserialize_from_humantime() {
        let config: WorkerConfig = toml::from_str(
            r#"
            worker_count = 4
            download_timeout = "90s"
            task_timeout = "5m"
            progress_buffer_size = 16
            "#,
        )
        .unwrap();
        assert_eq!(config.download_timeout, Duration::from_secs(90));
        assert_eq!(config.task_timeout, Duration::from_secs(300));
    }
}
