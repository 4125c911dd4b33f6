//! Progress display for fetch runs
//!
//! A single indicatif bar fed by [`PoolEvent`]s. The bar is only drawn when
//! stderr is a terminal; otherwise events are drained silently and the log
//! output carries the progress.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::app::PoolEvent;

/// Running progress display
pub struct ProgressDisplay {
    handle: JoinHandle<DisplayTotals>,
}

/// Counts observed by the display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayTotals {
    pub finished: u64,
    pub failed: u64,
}

impl ProgressDisplay {
    /// Start consuming events, drawing a bar only when `draw` is set and
    /// stderr is a terminal
    pub fn start(draw: bool, buffer: usize) -> (mpsc::Sender<PoolEvent>, Self) {
        let is_terminal = atty::is(atty::Stream::Stderr);
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let handle = tokio::spawn(consume(rx, draw && is_terminal));
        (tx, Self { handle })
    }

    /// Wait for the event stream to close and clear the bar
    pub async fn finish(self) -> DisplayTotals {
        match self.handle.await {
            Ok(totals) => totals,
            Err(e) => {
                debug!("Progress display task failed: {}", e);
                DisplayTotals::default()
            }
        }
    }
}

async fn consume(mut rx: mpsc::Receiver<PoolEvent>, draw: bool) -> DisplayTotals {
    let mut totals = DisplayTotals::default();
    let mut bar: Option<ProgressBar> = None;

    while let Some(event) = rx.recv().await {
        match event {
            PoolEvent::Planned { total } => {
                if draw {
                    bar = Some(new_bar(total as u64));
                }
            }
            PoolEvent::Started { dataset_id, .. } => {
                if let Some(bar) = &bar {
                    bar.set_message(dataset_id);
                }
            }
            PoolEvent::Finished { success, .. } => {
                totals.finished += 1;
                if !success {
                    totals.failed += 1;
                }
                if let Some(bar) = &bar {
                    bar.inc(1);
                    if totals.failed > 0 {
                        bar.set_prefix(format!("{} failed", totals.failed));
                    }
                }
            }
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    totals
}

fn new_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {prefix:.red} {msg}")
    {
        bar.set_style(style.progress_chars("##-"));
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_display_counts_events_without_terminal() {
        let (tx, display) = ProgressDisplay::start(false, 8);
        tx.send(PoolEvent::Planned { total: 2 }).await.unwrap();
        for (id, success) in [("a", true), ("b", false)] {
            tx.send(PoolEvent::Started {
                worker_id: 0,
                dataset_id: id.to_string(),
            })
            .await
            .unwrap();
            tx.send(PoolEvent::Finished {
                worker_id: 0,
                dataset_id: id.to_string(),
                success,
            })
            .await
            .unwrap();
        }
        drop(tx);

        assert_eq!(
            display.finish().await,
            DisplayTotals {
                finished: 2,
                failed: 1
            }
        );
    }
}
