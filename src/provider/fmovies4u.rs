// Fmovies4u provider — JSON API whose links point at the site's own proxy.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::error::ProviderError;
use super::traits::{Provider, RetryPolicy};
use super::types::{MediaRequest, ProviderOutput, StreamFile, StreamKind, Subtitle};
use crate::config::BROWSER_USER_AGENT;

const PROVIDER: &str = "Fmovies4u";
const DEFAULT_BASE_URL: &str = "https://fmovies4u.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub struct Fmovies4uProvider {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

/// How a single attempt ended when it did not produce streams.
enum AttemptError {
    /// Worth another try; returned as-is once attempts run out.
    Retry(ProviderError),
    Fatal(ProviderError),
}

impl Fmovies4uProvider {
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at another deployment of the same API.
    pub fn with_base_url(base_url: &str) -> Result<Self, ProviderError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let origin = HeaderValue::from_str(&base_url)
            .map_err(|e| ProviderError::broken(PROVIDER, format!("invalid base url: {}", e)))?;
        headers.insert(REFERER, origin.clone());
        headers.insert(ORIGIN, origin);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::unavailable(PROVIDER, e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Episode lookups need both numbers; the id is percent-encoded into the path.
    fn api_url(&self, media: &MediaRequest) -> Result<String, ProviderError> {
        let tmdb = urlencoding::encode(&media.tmdb);
        if !media.is_tv() {
            return Ok(format!("{}/api/movie/{}", self.base_url, tmdb));
        }
        match (media.season, media.episode) {
            (Some(season), Some(episode)) => Ok(format!(
                "{}/api/tv/{}/{}/{}",
                self.base_url, tmdb, season, episode
            )),
            _ => Err(ProviderError::invalid_request(
                PROVIDER,
                "TV lookups need both season and episode",
            )),
        }
    }

    async fn attempt(&self, api_url: &str) -> Result<ProviderOutput, AttemptError> {
        let resp = self.client.get(api_url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                AttemptError::Retry(ProviderError::unavailable(PROVIDER, e.to_string()))
            } else {
                AttemptError::Fatal(ProviderError::upstream(
                    PROVIDER,
                    format!("Request failed: {}", e),
                    500,
                ))
            }
        })?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(AttemptError::Fatal(ProviderError::upstream(
                PROVIDER,
                format!("Request failed with status code {}", status.as_u16()),
                500,
            )));
        }

        let api_error = || {
            ProviderError::upstream(PROVIDER, "No streams found (API Error)", status.as_u16())
        };

        if status != StatusCode::OK {
            debug!("[{}] unexpected status {}", PROVIDER, status.as_u16());
            return Err(AttemptError::Retry(api_error()));
        }

        let body: ApiResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!("[{}] undecodable response: {}", PROVIDER, e);
                return Err(AttemptError::Retry(api_error()));
            }
        };
        if !body.success {
            debug!("[{}] API returned success: false", PROVIDER);
            return Err(AttemptError::Retry(api_error()));
        }

        let output = self.normalize(body);
        if output.files.is_empty() {
            debug!("[{}] no files in response", PROVIDER);
            return Err(AttemptError::Retry(ProviderError::not_found(
                PROVIDER,
                "No streams available",
            )));
        }
        Ok(output)
    }

    fn normalize(&self, body: ApiResponse) -> ProviderOutput {
        let mut output = ProviderOutput::default();

        for source in body.sources {
            let provider_name = non_empty(source.provider).unwrap_or_else(|| "Superior".to_string());
            let source_headers = source.headers.unwrap_or_default();

            for item in source.url.into_items() {
                let Some(link) = non_empty(item.link) else {
                    continue;
                };
                let (file, mut headers) = extract_stream(&link, &self.base_url);
                if file.is_empty() {
                    continue;
                }
                headers.extend(source_headers.clone());

                let kind = if item.kind.as_deref() == Some("hls") {
                    StreamKind::Hls
                } else {
                    StreamKind::Mp4
                };
                let quality = non_empty(item.quality)
                    .or_else(|| non_empty(item.lang))
                    .unwrap_or_else(|| "Auto".to_string());

                output.files.push(StreamFile {
                    file,
                    kind,
                    source: format!("{}-{}", PROVIDER, provider_name),
                    quality,
                    headers,
                });
            }

            for track in source.tracks.into_items() {
                if let Some(url) = non_empty(track.file) {
                    output.subtitles.push(Subtitle {
                        url,
                        lang: non_empty(track.label).unwrap_or_else(|| "English".to_string()),
                    });
                }
            }
        }

        output
    }
}

#[async_trait]
impl Provider for Fmovies4uProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(&self, media: &MediaRequest) -> Result<ProviderOutput, ProviderError> {
        let api_url = self.api_url(media)?;
        let mut attempt = 1;

        loop {
            debug!(
                "[{}] attempt {}/{}: {}",
                PROVIDER, attempt, self.retry.max_attempts, api_url
            );

            match self.attempt(&api_url).await {
                Ok(output) => return Ok(output),
                Err(AttemptError::Retry(err)) if self.retry.has_more(attempt) => {
                    let delay = self.retry.delay_after(attempt);
                    debug!("[{}] {}; retrying in {:?}", PROVIDER, err.message(), delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(AttemptError::Retry(err)) | Err(AttemptError::Fatal(err)) => {
                    warn!("[{}] giving up after attempt {}: {}", PROVIDER, attempt, err.message());
                    return Err(err);
                }
            }
        }
    }
}

/// Resolve a site proxy link into the real stream URL and the headers it needs.
///
/// The target lives in the `url` query parameter and the headers in
/// `headers` (JSON). Links without a `url` parameter are used as-is.
pub fn extract_stream(link: &str, base_url: &str) -> (String, HashMap<String, String>) {
    let Ok(parsed) = Url::parse(link) else {
        return (link.to_string(), HashMap::new());
    };

    let stream_url = match query_param(&parsed, "url") {
        Some(encoded) => {
            let decoded = urlencoding::decode(&encoded)
                .map(|d| d.into_owned())
                .unwrap_or(encoded);
            resolve_stream_path(&decoded, base_url)
        }
        None => link.to_string(),
    };

    let headers = query_param(&parsed, "headers")
        .map(|raw| parse_link_headers(&raw))
        .unwrap_or_default();

    (stream_url, headers)
}

fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn resolve_stream_path(path: &str, base_url: &str) -> String {
    if path.starts_with("file2/") {
        format!("{}/{}", base_url, path)
    } else if let Some(rest) = path.strip_prefix("//") {
        format!("https://{}", rest)
    } else if !path.starts_with("http://") && !path.starts_with("https://") {
        format!("{}/{}", base_url, path)
    } else {
        path.to_string()
    }
}

fn parse_link_headers(raw: &str) -> HashMap<String, String> {
    if let Ok(decoded) = urlencoding::decode(raw) {
        if let Ok(headers) = serde_json::from_str(&decoded) {
            return headers;
        }
    }
    serde_json::from_str(raw).unwrap_or_default()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    sources: Vec<ApiSource>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    url: Lenient<ApiLink>,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
    #[serde(default)]
    tracks: Lenient<ApiTrack>,
}

#[derive(Debug, Deserialize)]
struct ApiLink {
    #[serde(default)]
    link: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

/// A list field the API sometimes fills with something else entirely.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    List(Vec<T>),
    Other(serde_json::Value),
}

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Self::Other(serde_json::Value::Null)
    }
}

impl<T> Lenient<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Self::List(items) => items,
            Self::Other(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://fmovies4u.com";

    #[test]
    fn test_extract_file2_path() {
        let link = "https://proxy.fmovies4u.com/m3u8?url=file2%2Fabc%2Findex.m3u8";
        let (url, headers) = extract_stream(link, BASE);
        assert_eq!(url, "https://fmovies4u.com/file2/abc/index.m3u8");
        assert!(headers.is_empty());
    }

    #[test]
    fn test_extract_protocol_relative() {
        let link = "https://proxy.example/p?url=%2F%2Fcdn.example%2Fmaster.m3u8";
        let (url, _) = extract_stream(link, BASE);
        assert_eq!(url, "https://cdn.example/master.m3u8");
    }

    #[test]
    fn test_extract_relative_and_absolute() {
        let (url, _) = extract_stream("https://p.example/?url=hls%2Fx.m3u8", BASE);
        assert_eq!(url, "https://fmovies4u.com/hls/x.m3u8");

        let (url, _) = extract_stream(
            "https://p.example/?url=https%3A%2F%2Fcdn.example%2Fa.m3u8",
            BASE,
        );
        assert_eq!(url, "https://cdn.example/a.m3u8");
    }

    #[test]
    fn test_extract_double_encoded_url() {
        // The site sometimes encodes the target twice.
        let link = "https://p.example/?url=https%253A%252F%252Fcdn.example%252Fb.m3u8";
        let (url, _) = extract_stream(link, BASE);
        assert_eq!(url, "https://cdn.example/b.m3u8");
    }

    #[test]
    fn test_extract_headers_param() {
        let link = "https://p.example/?url=https%3A%2F%2Fcdn.example%2Fa.m3u8&headers=%7B%22Referer%22%3A%22https%3A%2F%2Fvid.example%2F%22%7D";
        let (_, headers) = extract_stream(link, BASE);
        assert_eq!(headers.get("Referer").unwrap(), "https://vid.example/");

        let link = "https://p.example/?url=https%3A%2F%2Fcdn.example%2Fa.m3u8&headers=not-json";
        let (_, headers) = extract_stream(link, BASE);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_extract_without_url_param_or_unparseable() {
        let link = "https://cdn.example/direct.mp4";
        assert_eq!(extract_stream(link, BASE).0, link);

        let (url, headers) = extract_stream("not a url", BASE);
        assert_eq!(url, "not a url");
        assert!(headers.is_empty());
    }

    #[test]
    fn test_api_urls() {
        let provider = Fmovies4uProvider::with_base_url("https://api.example/").unwrap();
        assert_eq!(
            provider.api_url(&MediaRequest::movie("155")).unwrap(),
            "https://api.example/api/movie/155"
        );
        assert_eq!(
            provider.api_url(&MediaRequest::episode("1399", 2, 5)).unwrap(),
            "https://api.example/api/tv/1399/2/5"
        );
        assert_eq!(
            provider.api_url(&MediaRequest::movie("a/b?c")).unwrap(),
            "https://api.example/api/movie/a%2Fb%3Fc"
        );
    }

    #[test]
    fn test_incomplete_episode_request_is_rejected() {
        let provider = Fmovies4uProvider::with_base_url("https://api.example").unwrap();

        let mut no_season = MediaRequest::episode("1399", 1, 1);
        no_season.season = None;
        let err = provider.api_url(&no_season).unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
        assert_eq!(err.status(), 400);

        let mut no_episode = MediaRequest::episode("1399", 1, 1);
        no_episode.episode = None;
        assert!(provider.api_url(&no_episode).is_err());
    }

    #[test]
    fn test_normalize_tolerates_odd_shapes() {
        let provider = Fmovies4uProvider::new().unwrap();
        let body: ApiResponse = serde_json::from_str(
            r#"{
                "success": true,
                "sources": [
                    {"provider": "", "url": "not-a-list", "tracks": {"x": 1}},
                    {
                        "provider": "Alpha",
                        "headers": {"Referer": "https://alpha.example/"},
                        "url": [
                            {"link": "https://p.example/?url=https%3A%2F%2Fcdn.example%2Fa.m3u8&headers=%7B%22Referer%22%3A%22x%22%2C%22Origin%22%3A%22o%22%7D", "type": "hls", "quality": "1080p"},
                            {"link": "https://cdn.example/b.mp4", "lang": "en"},
                            {"type": "hls"}
                        ],
                        "tracks": [{"file": "https://subs.example/en.vtt"}, {"file": "https://subs.example/es.vtt", "label": "Spanish"}, {"label": "empty"}]
                    }
                ]
            }"#,
        )
        .unwrap();

        let output = provider.normalize(body);
        assert_eq!(output.files.len(), 2);

        let first = &output.files[0];
        assert_eq!(first.file, "https://cdn.example/a.m3u8");
        assert_eq!(first.kind, StreamKind::Hls);
        assert_eq!(first.source, "Fmovies4u-Alpha");
        assert_eq!(first.quality, "1080p");
        // Source-level headers win over link headers.
        assert_eq!(first.headers.get("Referer").unwrap(), "https://alpha.example/");
        assert_eq!(first.headers.get("Origin").unwrap(), "o");

        let second = &output.files[1];
        assert_eq!(second.kind, StreamKind::Mp4);
        assert_eq!(second.quality, "en");

        assert_eq!(output.subtitles.len(), 2);
        assert_eq!(output.subtitles[0].lang, "English");
        assert_eq!(output.subtitles[1].lang, "Spanish");
    }
}
