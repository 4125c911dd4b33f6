//! Rate-limited HTTP GET operations
//!
//! Every request, manifest or dataset, waits on one shared governor rate
//! limiter before it is sent. Requests are attempted once; a failed dataset
//! is picked up again by the next run's change detection.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::Client;
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

type DirectRateLimiter = RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// HTTP operations handler with rate limiting
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: DirectRateLimiter,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limit
    ///
    /// # Errors
    ///
    /// Returns `DownloadError::ConfigurationError` if `rate_limit_rps` is zero
    pub fn new(client: Client, rate_limit_rps: u32) -> DownloadResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(rate_limit_rps: u32) -> DownloadResult<DirectRateLimiter> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| {
            DownloadError::ConfigurationError("Rate limit must be non-zero".to_string())
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    /// Issue a single rate-limited GET and return the body on a 2xx status
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` for transport failures, request timeouts and
    /// non-success statuses (404 and 403 get their own variants)
    pub async fn get_bytes(&self, url: &Url, timeout: Duration) -> DownloadResult<Vec<u8>> {
        // Jitter avoids all workers firing on the same tick
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status.as_u16() {
                404 => DownloadError::NotFound {
                    url: url.to_string(),
                },
                403 => DownloadError::Forbidden {
                    url: url.to_string(),
                },
                status => DownloadError::ServerError { status },
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;
        tracing::debug!("Fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

fn map_transport_error(error: reqwest::Error, timeout: Duration) -> DownloadError {
    if error.is_timeout() {
        DownloadError::Timeout {
            seconds: timeout.as_secs(),
        }
    } else {
        DownloadError::Http(error)
    }
}
