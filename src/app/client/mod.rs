//! HTTP access to the CMS Provider Data Catalog
//!
//! The pipeline never talks to reqwest directly. It goes through the
//! [`RemoteSource`] trait so the manifest fetcher and the fetch pool can be
//! driven by an in-memory source in tests.
//!
//! - [`config`] - Client configuration and reqwest client construction
//! - [`http`] - Rate-limited single-attempt GET

pub mod config;
pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

pub use config::ClientConfig;
pub use http::HttpHandler;

/// Anything that can return the body of a URL
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Retrieve the full body of `url`, giving up after `timeout`
    async fn get_bytes(&self, url: &str, timeout: Duration) -> DownloadResult<Vec<u8>>;
}

/// Production client for the CMS catalog and dataset downloads
#[derive(Debug)]
pub struct CmsClient {
    http: HttpHandler,
}

impl CmsClient {
    /// Create a client with default configuration
    pub fn new() -> DownloadResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with a custom configuration
    pub fn with_config(config: ClientConfig) -> DownloadResult<Self> {
        config.validate()?;
        let client = config.build_http_client()?;
        let http = HttpHandler::new(client, config.rate_limit_rps)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl RemoteSource for CmsClient {
    async fn get_bytes(&self, url: &str, timeout: Duration) -> DownloadResult<Vec<u8>> {
        let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        })?;
        self.http.get_bytes(&parsed, timeout).await
    }
}
