//! In-memory `RemoteSource` and fast pool settings used by unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::app::client::RemoteSource;
use crate::app::worker::WorkerConfig;
use crate::errors::{DownloadError, DownloadResult};

/// Two workers with five second deadlines
pub fn test_worker_config() -> WorkerConfig {
    WorkerConfig {
        worker_count: 2,
        download_timeout: Duration::from_secs(5),
        task_timeout: Duration::from_secs(5),
        progress_buffer_size: 10,
    }
}

/// Canned response for one URL
#[derive(Debug, Clone)]
pub enum Canned {
    Body(Vec<u8>),
    Delayed(Duration, Vec<u8>),
    Status(u16),
    Hang,
    Panic,
}

/// Serves canned bodies by URL and counts every request
#[derive(Debug, Default)]
pub struct StaticSource {
    responses: HashMap<String, Canned>,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Body(body.into()));
        self
    }

    pub fn with_delayed_body(mut self, url: &str, delay: Duration, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Delayed(delay, body.into()));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Status(status));
        self
    }

    pub fn with_hang(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), Canned::Hang);
        self
    }

    pub fn with_panic(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), Canned::Panic);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Highest number of requests that were in progress at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for StaticSource {
    async fn get_bytes(&self, url: &str, timeout: Duration) -> DownloadResult<Vec<u8>> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        match self.responses.get(url) {
            Some(Canned::Body(body)) => Ok(body.clone()),
            Some(Canned::Delayed(delay, body)) => {
                tokio::time::sleep(*delay).await;
                Ok(body.clone())
            }
            Some(Canned::Status(404)) | None => Err(DownloadError::NotFound {
                url: url.to_string(),
            }),
            Some(Canned::Status(status)) => Err(DownloadError::ServerError { status: *status }),
            Some(Canned::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(DownloadError::Timeout {
                    seconds: timeout.as_secs(),
                })
            }
            Some(Canned::Panic) => panic!("canned panic for {url}"),
        }
    }
}
