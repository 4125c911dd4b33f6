//! Hospital Fetcher CLI application
//!
//! Keeps a local copy of the CMS hospital datasets current: only datasets
//! whose catalog version changed since the last successful run are fetched.

use std::process;

use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

use hospital_fetcher::cli::{handle_run, Cli};
use hospital_fetcher::config::AppConfig;
use hospital_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if !e.is_fatal() {
            eprintln!("This error is usually transient; running again may succeed.");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config.logging.level);
    info!("Hospital Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    let report = handle_run(&cli, config).await?;
    if report.has_failures() {
        info!(
            "{} dataset(s) failed and will be retried on the next run",
            report.summary.failed
        );
    }
    Ok(())
}

/// Initialize logging from the CLI flags and the configured level
fn init_logging(cli: &Cli, configured_level: &str) {
    let level: LevelFilter = cli.log_level(configured_level).parse().unwrap_or_else(|_| {
        eprintln!(
            "Warning: unknown log level '{}', using info",
            configured_level
        );
        LevelFilter::INFO
    });

    let filter = EnvFilter::from_default_env().add_directive(
        format!("hospital_fetcher={}", level)
            .parse()
            .unwrap_or_else(|_| level.into()),
    );

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
