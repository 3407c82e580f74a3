//! Snapshot fetcher for remote and local locations
//!
//! Each location is read exactly once per session. Failures are reported to
//! the caller as-is: retrying is a presentation-layer decision, so there is
//! no backoff loop here.

use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT},
    Client,
};

use super::{SnapshotError, SnapshotLocation};
use crate::config::FetchConfig;

/// Reads snapshot bytes from a [`SnapshotLocation`]
#[derive(Debug, Clone)]
pub struct SnapshotFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,
}

impl SnapshotFetcher {
    /// Create a fetcher with default settings
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Http` if the HTTP client cannot be created
    pub fn new() -> Result<Self, SnapshotError> {
        Self::with_config(&FetchConfig::default())
    }

    /// Create a fetcher from fetch configuration
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Http` if the HTTP client cannot be created
    pub fn with_config(config: &FetchConfig) -> Result<Self, SnapshotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .default_headers(Self::build_headers(&config.user_agent))
            .build()?;

        Ok(Self { client })
    }

    /// Read the full content of a location
    ///
    /// # Errors
    ///
    /// - `SnapshotError::Status` for non-success HTTP responses
    /// - `SnapshotError::Timeout` when the request times out
    /// - `SnapshotError::Http` for other transport failures
    /// - `SnapshotError::Io` when a local file cannot be read
    pub async fn fetch(&self, location: &SnapshotLocation) -> Result<Vec<u8>, SnapshotError> {
        match location {
            SnapshotLocation::Remote(url) => {
                tracing::debug!(url = %url, "Fetching remote snapshot");
                let response = self.client.get(url.clone()).send().await.map_err(|e| {
                    if e.is_timeout() {
                        SnapshotError::Timeout
                    } else {
                        SnapshotError::Http(e)
                    }
                })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(SnapshotError::Status(status.as_u16()));
                }

                let bytes = response.bytes().await.map_err(|e| {
                    if e.is_timeout() {
                        SnapshotError::Timeout
                    } else {
                        SnapshotError::Http(e)
                    }
                })?;
                Ok(bytes.to_vec())
            }
            SnapshotLocation::Local(path) => {
                tracing::debug!(path = %path.display(), "Reading local snapshot");
                Ok(tokio::fs::read(path).await?)
            }
        }
    }

    fn build_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/x-ndjson, application/json;q=0.9, */*;q=0.5"),
        );

        headers
    }
}
