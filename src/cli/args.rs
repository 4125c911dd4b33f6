//! Command-line argument parsing for Hospital Fetcher
//!
//! The binary does one thing, so there are no subcommands: global options
//! control logging and configuration, run options control the pipeline.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::config::AppConfig;
use crate::constants::workers;

/// Hospital Fetcher - keep a local copy of CMS hospital datasets current
#[derive(Parser, Debug)]
#[command(
    name = "hospital_fetcher",
    version,
    about = "Download changed CMS hospital datasets and normalize their headers",
    long_about = "Fetches the CMS Provider Data Catalog manifest, selects datasets carrying the
requested theme whose version changed since the last successful run, downloads them
concurrently, rewrites their CSV headers to snake_case and records the new versions."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Pipeline options
    #[command(flatten)]
    pub run: RunArgs,
}

/// Logging and configuration options
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Options for one pipeline run
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Fetch every matching dataset regardless of the ledger
    #[arg(long)]
    pub force_refresh: bool,

    /// Number of concurrent fetch workers
    #[arg(short = 'w', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Theme tag selecting datasets
    #[arg(short, long, value_name = "THEME")]
    pub theme: Option<String>,

    /// Show which datasets are due without fetching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Use the local manifest snapshot without contacting the catalog
    #[arg(long)]
    pub offline: bool,

    /// Directory receiving normalized CSV files
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level directive for this invocation
    ///
    /// Flags win over the configured level.
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        if self.global.quiet {
            "error"
        } else if self.global.very_verbose {
            "debug"
        } else if self.global.verbose {
            "info"
        } else {
            configured
        }
    }

    /// Whether a progress bar may be drawn
    pub fn show_progress(&self) -> bool {
        !self.global.quiet && !self.run.dry_run
    }
}

impl RunArgs {
    /// Reject flag values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if let Some(count) = self.workers {
            if count == 0 || count > workers::MAX_WORKER_COUNT {
                return Err(format!(
                    "--workers must be between 1 and {}",
                    workers::MAX_WORKER_COUNT
                ));
            }
        }

        if matches!(&self.theme, Some(theme) if theme.trim().is_empty()) {
            return Err("--theme must not be empty".to_string());
        }

        Ok(())
    }

    /// Overlay the flags that were given onto `config`
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(count) = self.workers {
            config.workers.worker_count = count;
        }
        if let Some(theme) = &self.theme {
            config.catalog.theme = theme.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.storage.output_dir = dir.clone();
        }
        if self.offline {
            config.catalog.offline = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "hospital_fetcher",
            "--force-refresh",
            "--workers",
            "8",
            "--theme",
            "Dialysis facilities",
            "--offline",
            "--output-dir",
            "/tmp/out",
            "-v",
        ])
        .unwrap();

        assert!(cli.run.force_refresh);
        assert_eq!(cli.run.workers, Some(8));
        assert_eq!(cli.run.theme.as_deref(), Some("Dialysis facilities"));
        assert!(cli.run.offline);
        assert!(cli.global.verbose);
        assert_eq!(cli.log_level("warn"), "info");
    }

    #[test]
    fn test_log_level_precedence() {
        let cli = Cli::try_parse_from(["hospital_fetcher"]).unwrap();
        assert_eq!(cli.log_level("warn"), "warn");

        let cli = Cli::try_parse_from(["hospital_fetcher", "-q", "--very-verbose"]).unwrap();
        assert_eq!(cli.log_level("info"), "error");
        assert!(!cli.show_progress());
    }

    #[test]
    fn test_validate_and_apply() {
        let args = RunArgs {
            workers: Some(0),
            ..Default::default()
        };
        assert!(args.validate().is_err());

        let args = RunArgs {
            workers: Some(3),
            theme: Some("Hospitals".to_string()),
            offline: true,
            ..Default::default()
        };
        assert!(args.validate().is_ok());

        let mut config = AppConfig::default();
        args.apply_to(&mut config);
        assert_eq!(config.workers.worker_count, 3);
        assert!(config.catalog.offline);
        assert_eq!(
            config.storage.output_dir,
            AppConfig::default().storage.output_dir
        );
    }
}
