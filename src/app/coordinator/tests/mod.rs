//! Coordinator tests against an in-memory catalog

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::app::coordinator::{Coordinator, RunOptions};
use crate::app::detector::DueReason;
use crate::app::ledger::LedgerStore;
use crate::app::manifest::{ManifestConfig, ManifestFetcher};
use crate::app::models::ManifestOrigin;
use crate::app::run_log::RunLog;
use crate::app::storage::DatasetStore;
use crate::app::testing::{test_worker_config, StaticSource};
use crate::app::worker::FetchPool;
use crate::errors::AppError;

const MANIFEST_URL: &str = "https://catalog.test/items";

fn manifest_body(versions: &[(&str, &str, &str)]) -> String {
    let items: Vec<String> = versions
        .iter()
        .map(|(id, theme, version)| {
            format!(
                r#"{{"identifier": "{id}", "title": "{id}", "theme": ["{theme}"],
                    "modified": "{version}",
                    "distribution": [{{"downloadURL": "https://data.test/{id}.csv"}}]}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

struct Harness {
    dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn coordinator(&self, source: Arc<StaticSource>) -> Coordinator {
        let manifest = ManifestFetcher::new(
            ManifestConfig {
                manifest_url: MANIFEST_URL.to_string(),
                fallback_path: self.path("snapshot.json"),
                timeout: Duration::from_secs(1),
                offline: false,
            },
            source.clone(),
        );
        Coordinator::new(
            manifest,
            LedgerStore::new(self.path("ledger.json")),
            FetchPool::new(
                test_worker_config(),
                source,
                Arc::new(DatasetStore::new(self.path("out"))),
            ),
            RunLog::new(self.path("run_log.txt"), "hospital_fetcher --test"),
        )
    }

    fn run_log(&self) -> String {
        std::fs::read_to_string(self.path("run_log.txt")).unwrap_or_default()
    }
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

/// Test a dry run reports due datasets without fetching or committing
#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let harness = Harness::new();
    let source = Arc::new(
        StaticSource::new()
            .with_body(
                MANIFEST_URL,
                manifest_body(&[("a", "Hospitals", "1"), ("b", "Nursing homes", "1")]),
            )
            .with_body("https://data.test/a.csv", "Name\nx\n"),
    );

    let report = harness
        .coordinator(source.clone())
        .run(&RunOptions::default().with_dry_run(true), None)
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.matched, 1);
    assert_eq!(report.due.len(), 1);
    assert_eq!(report.due[0].reason, DueReason::New);
    assert_eq!(source.calls("https://data.test/a.csv"), 0);
    assert!(!harness.path("ledger.json").exists());
    assert!(harness.run_log().contains("Dry run: 1 of 1 dataset(s) due"));
}

/// Test failures are reported but never committed
#[tokio::test]
async fn test_partial_failure_commits_only_successes() {
    let harness = Harness::new();
    let source = Arc::new(
        StaticSource::new()
            .with_body(
                MANIFEST_URL,
                manifest_body(&[("a", "Hospitals", "1"), ("b", "Hospitals", "1")]),
            )
            .with_body("https://data.test/a.csv", "Facility Name\nx\n")
            .with_status("https://data.test/b.csv", 500),
    );

    let report = harness
        .coordinator(source)
        .run(&RunOptions::default(), None)
        .await
        .unwrap();

    assert_eq!(report.origin, ManifestOrigin::Network);
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.failed, 1);
    assert!(report.has_failures());

    let ledger = LedgerStore::new(harness.path("ledger.json"))
        .load()
        .await
        .unwrap();
    assert_eq!(ledger.version_of("a"), Some("1"));
    assert!(ledger.get("b").is_none());
    assert_eq!(read(&harness.path("out/a.csv")), b"facility_name\nx\n");

    let log = harness.run_log();
    assert!(log.contains("Fetched a (version 1"));
    assert!(log.contains("Failed b: download failed"));
    assert!(log.contains("Downloaded 1 file(s), 1 failed, 0 unchanged"));
}

/// Test an up-to-date catalog makes no dataset requests and leaves the ledger alone
#[tokio::test]
async fn test_nothing_to_update() {
    let harness = Harness::new();
    let body = manifest_body(&[("a", "Hospitals", "1")]);
    let first = Arc::new(
        StaticSource::new()
            .with_body(MANIFEST_URL, body.clone())
            .with_body("https://data.test/a.csv", "Name\nx\n"),
    );
    harness
        .coordinator(first)
        .run(&RunOptions::default(), None)
        .await
        .unwrap();
    let ledger_before = read(&harness.path("ledger.json"));

    let second = Arc::new(
        StaticSource::new()
            .with_body(MANIFEST_URL, body)
            .with_body("https://data.test/a.csv", "Name\nx\n"),
    );
    let report = harness
        .coordinator(second.clone())
        .run(&RunOptions::default(), None)
        .await
        .unwrap();

    assert_eq!(report.summary.skipped_unchanged, 1);
    assert!(report.results.is_empty());
    assert_eq!(second.calls("https://data.test/a.csv"), 0);
    assert_eq!(read(&harness.path("ledger.json")), ledger_before);
    assert!(harness.run_log().contains("Nothing to update"));
}

/// Test a manifest outage aborts before the ledger is read or written
#[tokio::test]
async fn test_manifest_unavailable_aborts() {
    let harness = Harness::new();
    let source = Arc::new(StaticSource::new().with_status(MANIFEST_URL, 503));

    let err = harness
        .coordinator(source.clone())
        .run(&RunOptions::default(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Manifest(_)));
    assert_eq!(source.total_calls(), 1);
    assert!(!harness.path("ledger.json").exists());
    assert!(harness.run_log().contains("Run aborted"));
}

/// Test a corrupt ledger aborts before any dataset is fetched
#[tokio::test]
async fn test_corrupt_ledger_aborts() {
    let harness = Harness::new();
    std::fs::write(harness.path("ledger.json"), "{{{").unwrap();
    let source = Arc::new(
        StaticSource::new()
            .with_body(MANIFEST_URL, manifest_body(&[("a", "Hospitals", "1")]))
            .with_body("https://data.test/a.csv", "Name\nx\n"),
    );

    let err = harness
        .coordinator(source.clone())
        .run(&RunOptions::default(), None)
        .await
        .unwrap_err();

    assert_eq!(err.category(), "ledger");
    assert_eq!(source.calls("https://data.test/a.csv"), 0);
    assert_eq!(read(&harness.path("ledger.json")), b"{{{");
}
