// Segment relay — one upstream GET piped to one client response with backpressure.

use std::io;

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, error};
use url::Url;

use super::error::RelayError;
use super::headers::{outbound_headers, HeadersPayload};
use super::upstream::UpstreamClient;
use crate::config::{DEFAULT_SEGMENT_CONTENT_TYPE, RELAY_CHUNK_BYTES, SEGMENT_CACHE_CONTROL};

/// One client's request to relay a remote segment.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RelayRequest {
    #[serde(default, rename = "url")]
    pub target_url: String,
    #[serde(default)]
    pub headers: HeadersPayload,
}

impl RelayRequest {
    pub fn new(target_url: impl Into<String>, headers: impl Into<HeadersPayload>) -> Self {
        Self {
            target_url: target_url.into(),
            headers: headers.into(),
        }
    }
}

pub struct SegmentRelay {
    upstream: UpstreamClient,
    disabled: bool,
}

impl SegmentRelay {
    pub fn new(disabled: bool) -> Result<Self, RelayError> {
        Ok(Self::with_client(UpstreamClient::new()?, disabled))
    }

    pub fn with_client(upstream: UpstreamClient, disabled: bool) -> Self {
        Self { upstream, disabled }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Relay a segment. Every failure is turned into a response here.
    pub async fn relay(&self, request: RelayRequest) -> Response {
        let label = segment_label(&request.target_url);
        match self.open(request).await {
            Ok(resp) => resp,
            Err(err) => {
                match &err {
                    RelayError::UpstreamUnavailable(reason) => {
                        error!("[segment relay] {}: {}", label, reason);
                    }
                    other if other.is_silent() => {}
                    other => debug!("[segment relay] {}: {}", label, other),
                }
                err.into_response()
            }
        }
    }

    /// Validate, contact the origin, and build the streaming response.
    ///
    /// Nothing is sent upstream until the target and headers are known good.
    pub async fn open(&self, request: RelayRequest) -> Result<Response, RelayError> {
        if self.disabled {
            return Err(RelayError::Disabled);
        }

        let target = parse_target(&request.target_url)?;
        let caller_headers = request.headers.into_map()?;
        let outbound = outbound_headers(&caller_headers)?;

        let label = segment_label(target.as_str());
        let upstream = self.upstream.open(target, outbound).await?;
        streaming_response(upstream, label)
    }
}

fn parse_target(raw: &str) -> Result<Url, RelayError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RelayError::InvalidRequest(
            "URL parameter is required".to_string(),
        ));
    }
    let url = Url::parse(raw)
        .map_err(|e| RelayError::InvalidRequest(format!("Invalid URL: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(RelayError::InvalidRequest(format!(
            "Unsupported URL scheme: {}",
            other
        ))),
    }
}

/// Last path segment of a target, used to keep log lines short.
fn segment_label(target: &str) -> String {
    let path = target.split(['?', '#']).next().unwrap_or(target);
    path.rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or(path)
        .to_string()
}

fn streaming_response(upstream: reqwest::Response, label: String) -> Result<Response, RelayError> {
    let status = upstream.status();
    let upstream_headers = upstream.headers();

    let content_type = upstream_headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_SEGMENT_CONTENT_TYPE));
    let content_length = upstream_headers.get(header::CONTENT_LENGTH).cloned();
    let content_encoding = upstream_headers.get(header::CONTENT_ENCODING).cloned();

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "*")
        .header(header::CACHE_CONTROL, SEGMENT_CACHE_CONTROL);
    if let Some(len) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }
    if let Some(encoding) = content_encoding {
        builder = builder.header(header::CONTENT_ENCODING, encoding);
    }

    let body = Body::from_stream(relay_body(upstream, label));
    builder
        .body(body)
        .map_err(|e| RelayError::UpstreamUnavailable(format!("response build: {}", e)))
}

/// Pull-driven body: the origin socket is only read when the client accepts
/// the previous chunk. Dropping the stream releases the upstream connection.
fn relay_body(
    upstream: reqwest::Response,
    label: String,
) -> impl futures::Stream<Item = io::Result<Bytes>> + Send + 'static {
    let reader = StreamReader::new(upstream.bytes_stream().map_err(io::Error::other));
    let chunks = Box::pin(ReaderStream::with_capacity(reader, RELAY_CHUNK_BYTES));
    let transfer = Transfer::new(label);

    stream::unfold((chunks, transfer), |(mut chunks, mut transfer)| async move {
        match chunks.next().await {
            Some(item) => {
                transfer.observe(&item);
                Some((item, (chunks, transfer)))
            }
            None => {
                transfer.finish();
                None
            }
        }
    })
}

/// Bookkeeping for a single relayed body.
struct Transfer {
    label: String,
    bytes: u64,
    done: bool,
}

impl Transfer {
    fn new(label: String) -> Self {
        Self {
            label,
            bytes: 0,
            done: false,
        }
    }

    fn observe(&mut self, item: &io::Result<Bytes>) {
        match item {
            Ok(chunk) => self.bytes += chunk.len() as u64,
            // Body errors only ever come from the origin side.
            Err(e) => {
                self.done = true;
                self.report(&RelayError::UpstreamUnavailable(e.to_string()));
            }
        }
    }

    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            debug!("[segment relay] {}: relayed {} bytes", self.label, self.bytes);
        }
    }

    fn report(&self, err: &RelayError) {
        if err.is_silent() {
            debug!("[segment relay] {}: {} after {} bytes", self.label, err, self.bytes);
        } else {
            error!("[segment relay] {}: {} after {} bytes", self.label, err, self.bytes);
        }
    }
}

impl Drop for Transfer {
    // Dropped before the end of the body: the client hung up.
    fn drop(&mut self) {
        if !self.done {
            self.report(&RelayError::ClientDisconnected);
        }
    }
}
