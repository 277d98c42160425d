use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

use super::error::RelayError;
use crate::config::{UPSTREAM_CONNECT_TIMEOUT, UPSTREAM_READ_TIMEOUT};

/// Shared HTTP client for segment origins.
///
/// Bodies are never decompressed, so relayed bytes match the origin exactly.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
}

impl UpstreamClient {
    pub fn new() -> Result<Self, RelayError> {
        let client = Client::builder()
            .connect_timeout(UPSTREAM_CONNECT_TIMEOUT)
            .read_timeout(UPSTREAM_READ_TIMEOUT)
            .build()
            .map_err(|e| RelayError::UpstreamUnavailable(format!("http client init: {}", e)))?;
        Ok(Self { client })
    }

    /// Issue the single GET for a segment and wait for its response head.
    ///
    /// A non-success status is returned as [`RelayError::UpstreamRejected`]
    /// without touching the body.
    pub async fn open(&self, url: Url, headers: HeaderMap) -> Result<Response, RelayError> {
        let resp = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| RelayError::UpstreamUnavailable(e.to_string()))?;

        let status = resp.status();
        debug!("upstream status={} url={}", status.as_u16(), resp.url());
        if !status.is_success() {
            return Err(RelayError::UpstreamRejected(status));
        }
        Ok(resp)
    }
}
