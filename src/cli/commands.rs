//! Command handler for the fetch run
//!
//! Wires configuration into the pipeline components, runs the coordinator
//! and prints a summary for the user.

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::{
    CmsClient, Coordinator, DatasetStore, FetchPool, LedgerStore, ManifestFetcher, RunLog,
    RunOptions, RunReport,
};
use crate::cli::args::Cli;
use crate::cli::progress::ProgressDisplay;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Run the pipeline once with `config` overlaid by the command line flags
///
/// Per-dataset failures are reported but do not make the command fail; only
/// configuration, manifest and ledger errors do.
pub async fn handle_run(cli: &Cli, mut config: AppConfig) -> Result<RunReport> {
    cli.run.validate().map_err(AppError::generic)?;
    cli.run.apply_to(&mut config);
    config.validate()?;

    let client = Arc::new(CmsClient::with_config(config.client_config())?);
    let worker_config = config.worker_config();
    let progress_buffer = worker_config.progress_buffer_size;

    let coordinator = Coordinator::new(
        ManifestFetcher::new(config.manifest_config(), client.clone()),
        LedgerStore::new(&config.storage.ledger_file),
        FetchPool::new(
            worker_config,
            client,
            Arc::new(DatasetStore::new(&config.storage.output_dir)),
        ),
        RunLog::for_current_process(&config.storage.run_log_file),
    );

    let options = RunOptions::default()
        .with_theme(config.catalog.theme.clone())
        .with_force_refresh(cli.run.force_refresh)
        .with_dry_run(cli.run.dry_run);
    info!(
        "Running with theme '{}' (force refresh: {}, dry run: {})",
        options.theme, options.force_refresh, options.dry_run
    );

    let report = if cli.show_progress() {
        let (tx, display) = ProgressDisplay::start(true, progress_buffer);
        let report = coordinator.run(&options, Some(tx)).await;
        display.finish().await;
        report?
    } else {
        coordinator.run(&options, None).await?
    };

    if !cli.global.quiet {
        print_report(&report, &config);
    }
    Ok(report)
}

fn print_report(report: &RunReport, config: &AppConfig) {
    println!(
        "Manifest: {} ({} dataset(s) with theme '{}')",
        report.origin, report.matched, config.catalog.theme
    );

    if report.dry_run {
        if report.due.is_empty() {
            println!("Nothing to update.");
        } else {
            println!("Would fetch {} dataset(s):", report.due.len());
            for due in &report.due {
                println!("  {:<12} {} [{}]", due.id, due.title, due.reason);
            }
        }
        return;
    }

    println!("{}", report.summary);
    for result in report.results.iter().filter(|r| !r.is_success()) {
        if let Some(reason) = result.failure_reason() {
            warn!("{} failed: {}", result.dataset_id, reason);
            println!("  failed: {} ({})", result.dataset_id, reason);
        }
    }
    if report.summary.succeeded > 0 {
        println!(
            "Output written to {}",
            config.storage.output_dir.display()
        );
    }
}
