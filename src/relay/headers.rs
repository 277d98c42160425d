// Outbound header construction for relayed segment requests.

use std::collections::HashMap;

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, CONNECTION, HOST, USER_AGENT,
};
use serde::Deserialize;

use super::error::RelayError;
use crate::config::BROWSER_USER_AGENT;

/// Header names whose prefix marks them as browser fetch metadata.
const SEC_FETCH_PREFIX: &str = "sec-fetch-";

/// Caller-supplied headers, either already decoded or as a JSON string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HeadersPayload {
    Map(HashMap<String, String>),
    Raw(String),
}

impl Default for HeadersPayload {
    fn default() -> Self {
        Self::Map(HashMap::new())
    }
}

impl HeadersPayload {
    /// Decode into a name/value map. An empty string means "no headers".
    pub fn into_map(self) -> Result<HashMap<String, String>, RelayError> {
        match self {
            Self::Map(map) => Ok(map),
            Self::Raw(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Self::Raw(raw) => serde_json::from_str(&raw)
                .map_err(|_| RelayError::InvalidRequest("Invalid headers format".to_string())),
        }
    }
}

impl From<HashMap<String, String>> for HeadersPayload {
    fn from(map: HashMap<String, String>) -> Self {
        Self::Map(map)
    }
}

impl From<String> for HeadersPayload {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

/// Headers that must never reach the origin, in any casing.
pub fn is_stripped(name: &HeaderName) -> bool {
    // HeaderName is always stored lowercase.
    name == HOST || name.as_str().starts_with(SEC_FETCH_PREFIX)
}

/// Build the header set for the upstream request.
///
/// Baseline browser headers first, caller headers on top (caller wins), then
/// `Host` and every `Sec-Fetch-*` entry removed.
pub fn outbound_headers(caller: &HashMap<String, String>) -> Result<HeaderMap, RelayError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    for (name, value) in caller {
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| {
            RelayError::InvalidRequest(format!("Invalid header name: {}", name))
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            RelayError::InvalidRequest(format!("Invalid value for header {}", name))
        })?;
        headers.insert(name, value);
    }

    let stripped: Vec<HeaderName> = headers
        .keys()
        .filter(|name| is_stripped(name))
        .cloned()
        .collect();
    for name in stripped {
        headers.remove(name);
    }

    Ok(headers)
}
