//! Backend contract for the mediamm server.
//!
//! This module provides the data structures exchanged with the server
//! (inventory items, search candidates, job snapshots, subtitle candidates)
//! and the [`Backend`] trait the workflow talks to. [`HttpBackend`] is the
//! implementation used against a live server.
mod http;
mod types;

pub use http::HttpBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the server answered with an HTTP error
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded or lacked an expected field
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The server answered with `ok: false`, optionally explaining why
    #[error("Backend rejected the request: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),
}

/// Identifier issued by an upstream catalogue (TMDB id, subtitle id).
///
/// Servers send these either as JSON numbers or strings; the original form
/// is kept so it can be echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaId::Number(n) => write!(f, "{n}"),
            MediaId::Text(s) => f.write_str(s),
        }
    }
}

/// A media file discovered by a directory scan.
///
/// Items are identified by their path and are only ever replaced by a
/// freshly fetched record, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Absolute path of the media file on the server
    pub path: String,
    /// File name shown on the card
    pub name: String,
    #[serde(default)]
    pub has_poster: bool,
    #[serde(default)]
    pub has_nfo: bool,
    #[serde(default)]
    pub has_fanart: bool,
}

/// A metadata search hit offered to the user for selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultCandidate {
    pub id: MediaId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default, alias = "poster")]
    pub poster_url: Option<String>,
}

impl SearchResultCandidate {
    /// The release year, taken from the first four characters of the date
    pub fn year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .filter(|year| !year.is_empty())
    }
}

/// Movie details returned when a scrape job is accepted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataPreview {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub genres: Vec<Option<String>>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

/// Response to a successful scrape submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeAccepted {
    /// Preview of the chosen movie for immediate display
    pub info: MetadataPreview,
    /// Opaque job identifier to poll
    pub job_id: String,
}

/// Which of the three scrape artifacts exist on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Artifacts {
    #[serde(default)]
    pub poster: bool,
    #[serde(default)]
    pub nfo: bool,
    #[serde(default)]
    pub fanart: bool,
}

impl Artifacts {
    /// Number of artifacts present
    pub fn count(&self) -> usize {
        [self.poster, self.nfo, self.fanart]
            .into_iter()
            .filter(|present| *present)
            .count()
    }
}

/// The state reported by a single job status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSnapshot {
    /// Whether the backend still works on the job
    pub running: bool,
    /// Artifacts found so far
    pub artifacts: Artifacts,
}

/// A subtitle search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCandidate {
    pub id: MediaId,
    #[serde(default, alias = "release")]
    pub release_label: String,
    #[serde(default, alias = "lang")]
    pub language: String,
    #[serde(default, alias = "desc")]
    pub description: Option<String>,
    #[serde(default)]
    pub files_count: Option<u32>,
}

/// Subtitle language requested from the download endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleLanguage {
    /// Simplified Chinese
    #[default]
    Chs,
    /// Traditional Chinese
    Cht,
    /// English
    Eng,
}

impl SubtitleLanguage {
    /// The language code sent on the wire
    pub fn code(&self) -> &'static str {
        match self {
            SubtitleLanguage::Chs => "chs",
            SubtitleLanguage::Cht => "cht",
            SubtitleLanguage::Eng => "eng",
        }
    }
}

impl fmt::Display for SubtitleLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SubtitleLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chs" | "zh-cn" | "sc" => Ok(SubtitleLanguage::Chs),
            "cht" | "zh-tw" | "tc" => Ok(SubtitleLanguage::Cht),
            "eng" | "en" | "english" => Ok(SubtitleLanguage::Eng),
            other => Err(format!(
                "unknown subtitle language '{other}' (expected chs, cht or eng)"
            )),
        }
    }
}

/// Trait for the server endpoints the workflow depends on.
///
/// Implementors map each call onto one request; they report transport,
/// decoding and `ok: false` failures through [`ApiError`] and leave all
/// user-facing interpretation to the caller.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Lists the media items below `root`
    async fn scan(&self, root: &str) -> Result<Vec<Item>, ApiError>;

    /// Searches the metadata catalogue, optionally narrowed to a release year
    async fn search_movies(
        &self,
        query: &str,
        year: Option<&str>,
    ) -> Result<Vec<SearchResultCandidate>, ApiError>;

    /// Starts a background scrape of `path` using catalogue entry `tmdb_id`
    async fn start_scrape(&self, path: &str, tmdb_id: &MediaId)
    -> Result<ScrapeAccepted, ApiError>;

    /// Reports the current state of a scrape job
    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot, ApiError>;

    /// Searches the subtitle catalogue
    async fn search_subtitles(&self, query: &str) -> Result<Vec<SubtitleCandidate>, ApiError>;

    /// Downloads a subtitle next to the media file, returning the saved path
    async fn download_subtitle(
        &self,
        path: &str,
        sub_id: &MediaId,
        lang: SubtitleLanguage,
    ) -> Result<String, ApiError>;
}
