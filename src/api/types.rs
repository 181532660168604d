/// mediamm server response and request bodies.
///
/// These structures mirror the JSON exchanged with the `/api/*` endpoints.
use super::{ApiError, Artifacts, Item, MediaId, MetadataPreview, SubtitleLanguage};
use serde::{Deserialize, Serialize};

/// The `{ ok, error?, ... }` wrapper shared by every endpoint except `/api/job`.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    /// Unwraps the payload, turning `ok: false` into [`ApiError::Rejected`].
    pub fn into_body(self) -> Result<T, ApiError> {
        if self.ok {
            Ok(self.body)
        } else {
            let reason = self.error.filter(|message| !message.trim().is_empty());
            Err(ApiError::Rejected(reason))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ScanBody {
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResultsBody<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ScrapeBody {
    #[serde(default)]
    pub info: Option<MetadataPreview>,
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SavedBody {
    #[serde(default)]
    pub saved: Option<String>,
}

/// `/api/job` answers without the `ok` wrapper.
#[derive(Debug, Deserialize)]
pub(super) struct JobBody {
    #[serde(default)]
    pub running: Option<bool>,
    #[serde(default)]
    pub cache: Option<Artifacts>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeRequest<'a> {
    pub path: &'a str,
    pub tmdb_id: &'a MediaId,
}

#[derive(Debug, Serialize)]
pub(super) struct SubtitleDownloadRequest<'a> {
    pub path: &'a str,
    pub sub_id: &'a MediaId,
    pub lang: SubtitleLanguage,
}
