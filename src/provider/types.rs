use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

/// What the caller wants streams for, keyed by TMDB id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRequest {
    pub tmdb: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl MediaRequest {
    pub fn movie(tmdb: impl Into<String>) -> Self {
        Self {
            tmdb: tmdb.into(),
            media_type: MediaType::Movie,
            season: None,
            episode: None,
        }
    }

    pub fn episode(tmdb: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            tmdb: tmdb.into(),
            media_type: MediaType::Tv,
            season: Some(season),
            episode: Some(episode),
        }
    }

    /// Episode lookups are recognised by an episode number as well as by type.
    pub fn is_tv(&self) -> bool {
        self.media_type == MediaType::Tv || self.episode.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Hls,
    Mp4,
}

/// A playable stream location. `headers` alone must be enough to fetch `file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFile {
    pub file: String,
    #[serde(rename = "type")]
    pub kind: StreamKind,
    pub source: String,
    pub quality: String,
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitle {
    pub url: String,
    pub lang: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOutput {
    pub files: Vec<StreamFile>,
    pub subtitles: Vec<Subtitle>,
}
