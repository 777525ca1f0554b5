use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::RangeReader;
use crate::error::IoError;

/// Default timeout for a single ranged read.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP-backed implementation of RangeReader.
///
/// Each call issues exactly one `GET` with a `Range` header against the
/// archive URL. There are no retries at this layer. The object size is not
/// fetched up front, so `size_hint` is always `None`.
#[derive(Clone)]
pub struct HttpRangeReader {
    client: Client,
    url: String,
}

impl HttpRangeReader {
    /// Create a reader for the given URL. No request is made here.
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Get the archive URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RangeReader for HttpRangeReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        if len == 0 {
            return Ok(Bytes::new());
        }

        // "bytes=start-end" is inclusive on both ends
        let end = offset
            .checked_add(len as u64 - 1)
            .ok_or(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: u64::MAX,
            })?;
        let range = format!("bytes={}-{}", offset, end);

        let response = self
            .client
            .get(&self.url)
            .header(RANGE, range)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    url = %self.url,
                    error = %e,
                    is_timeout = e.is_timeout(),
                    is_connect = e.is_connect(),
                    "Ranged read failed"
                );
                IoError::Network(format!("Request to {} failed: {}", self.url, e))
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(IoError::NotFound(self.url.clone()));
        }
        if !status.is_success() {
            return Err(IoError::Network(format!(
                "HTTP {} from {}",
                status.as_u16(),
                self.url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IoError::Network(format!("Failed to read body from {}: {}", self.url, e)))?;

        // A plain 200 means the server ignored the Range header and sent the
        // whole object; cut out the requested window ourselves.
        let window = if status == StatusCode::PARTIAL_CONTENT {
            body
        } else {
            debug!(url = %self.url, "Server ignored Range header, slicing full body");
            let start = offset.min(body.len() as u64) as usize;
            body.slice(start..)
        };

        if window.len() < len {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: offset + window.len() as u64,
            });
        }

        Ok(window.slice(..len))
    }

    fn size_hint(&self) -> Option<u64> {
        None
    }

    fn identifier(&self) -> &str {
        &self.url
    }
}

/// Create the shared HTTP client used for all remote archives.
///
/// Connection pooling is left on so that successive ranged reads against the
/// same host reuse warm connections.
pub fn create_http_client(timeout: Duration) -> Result<Client, IoError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("tile-streamer/", env!("CARGO_PKG_VERSION")))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_nodelay(true)
        .build()
        .map_err(|e| IoError::Network(format!("Failed to create HTTP client: {}", e)))
}
