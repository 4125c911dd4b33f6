//! Append-only run log
//!
//! One line per event: `<RFC 3339 timestamp> | <message> | <command line>`.
//! The log is for people reading it later; change detection never depends
//! on it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Handle to the run log file
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    command: String,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            command: command.into(),
        }
    }

    /// Run log for the current process, recording its own command line
    pub fn for_current_process(path: impl Into<PathBuf>) -> Self {
        let command = std::env::args().collect::<Vec<_>>().join(" ");
        Self::new(path, command)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event line
    ///
    /// Failures are logged and swallowed: losing a run log line must never
    /// fail a run.
    pub async fn append(&self, message: &str) {
        self.append_at(message, Utc::now()).await
    }

    pub async fn append_at(&self, message: &str, at: DateTime<Utc>) {
        let line = format_line(at, message, &self.command);
        if let Err(e) = self.write_line(&line).await {
            warn!("Could not append to run log {}: {}", self.path.display(), e);
        }
    }

    async fn write_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    /// Timestamp of the most recent line, if the log has one that parses
    pub async fn last_run_at(&self) -> Option<DateTime<Utc>> {
        let content = tokio::fs::read_to_string(&self.path).await.ok()?;
        let last = content.lines().rev().find(|l| !l.trim().is_empty())?;
        let stamp = last.split(" | ").next()?;
        match DateTime::parse_from_rfc3339(stamp.trim()) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                warn!("Unreadable timestamp in run log {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

fn format_line(at: DateTime<Utc>, message: &str, command: &str) -> String {
    // Keep one event per line whatever the message contains
    let message = message.replace(['\r', '\n'], " ");
    format!(
        "{} | {} | {}\n",
        at.to_rfc3339_opts(SecondsFormat::Secs, true),
        message,
        command
    )
}
