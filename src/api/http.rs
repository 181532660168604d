/// HTTP implementation of the mediamm backend contract.
use super::types::{
    Envelope, JobBody, ResultsBody, SavedBody, ScanBody, ScrapeBody, ScrapeRequest,
    SubtitleDownloadRequest,
};
use super::{
    ApiError, Backend, Item, JobSnapshot, MediaId, ScrapeAccepted,
    SearchResultCandidate, SubtitleCandidate, SubtitleLanguage,
};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Backend that talks to a running mediamm server over HTTP.
///
/// All endpoints live below `/api` on the configured base URL.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a backend for the server at `base_url`.
    ///
    /// `timeout` bounds every single request; there are no retries.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Decodes an `{ ok, error?, ... }` response.
    ///
    /// The body is decoded whatever the status, since the server reports
    /// rejections such as a duplicate job with an error status and a JSON
    /// envelope. Only an undecodable error response counts as transport
    /// failure.
    async fn envelope<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        match serde_json::from_slice::<Envelope<T>>(&bytes) {
            Ok(envelope) => envelope.into_body(),
            Err(e) if status.is_success() => Err(ApiError::Malformed(e.to_string())),
            Err(_) => Err(ApiError::Transport(http_status(status))),
        }
    }
}

fn http_status(status: StatusCode) -> String {
    format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

#[async_trait]
impl Backend for HttpBackend {
    async fn scan(&self, root: &str) -> Result<Vec<Item>, ApiError> {
        debug!(root, "requesting scan");
        let response = self
            .client
            .get(self.url("/api/scan"))
            .query(&[("root", root)])
            .send()
            .await
            .map_err(transport)?;

        let body: ScanBody = Self::envelope(response).await?;
        Ok(body.items)
    }

    async fn search_movies(
        &self,
        query: &str,
        year: Option<&str>,
    ) -> Result<Vec<SearchResultCandidate>, ApiError> {
        debug!(query, year, "searching metadata");
        let response = self
            .client
            .get(self.url("/api/search"))
            .query(&[("q", query), ("year", year.unwrap_or(""))])
            .send()
            .await
            .map_err(transport)?;

        let body: ResultsBody<SearchResultCandidate> = Self::envelope(response).await?;
        Ok(body.results)
    }

    async fn start_scrape(
        &self,
        path: &str,
        tmdb_id: &MediaId,
    ) -> Result<ScrapeAccepted, ApiError> {
        debug!(path, %tmdb_id, "submitting scrape");
        let response = self
            .client
            .post(self.url("/api/scrape"))
            .json(&ScrapeRequest { path, tmdb_id })
            .send()
            .await
            .map_err(transport)?;

        let body: ScrapeBody = Self::envelope(response).await?;
        let job_id = body
            .job_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::Malformed("scrape response lacks job_id".to_string()))?;

        Ok(ScrapeAccepted {
            info: body.info.unwrap_or_default(),
            job_id,
        })
    }

    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot, ApiError> {
        // The same id is polled repeatedly, so every request must bypass caches
        let cache_buster = ulid::Ulid::new().to_string();
        let response = self
            .client
            .get(self.url("/api/job"))
            .query(&[("id", job_id), ("t", cache_buster.as_str())])
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(ApiError::Transport(http_status(response.status())));
        }

        let body: JobBody = response
            .json()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))?;

        let running = body.running.ok_or_else(|| {
            ApiError::Malformed(match body.error {
                Some(error) => format!("job status lacks running flag: {error}"),
                None => "job status lacks running flag".to_string(),
            })
        })?;

        Ok(JobSnapshot {
            running,
            artifacts: body.cache.unwrap_or_default(),
        })
    }

    async fn search_subtitles(&self, query: &str) -> Result<Vec<SubtitleCandidate>, ApiError> {
        debug!(query, "searching subtitles");
        let response = self
            .client
            .get(self.url("/api/subtitles/search"))
            .query(&[("q", query)])
            .send()
            .await
            .map_err(transport)?;

        let body: ResultsBody<SubtitleCandidate> = Self::envelope(response).await?;
        Ok(body.results)
    }

    async fn download_subtitle(
        &self,
        path: &str,
        sub_id: &MediaId,
        lang: SubtitleLanguage,
    ) -> Result<String, ApiError> {
        debug!(path, %sub_id, %lang, "downloading subtitle");
        let response = self
            .client
            .post(self.url("/api/subtitles/download"))
            .json(&SubtitleDownloadRequest { path, sub_id, lang })
            .send()
            .await
            .map_err(transport)?;

        let body: SavedBody = Self::envelope(response).await?;
        body.saved
            .ok_or_else(|| ApiError::Malformed("download response lacks saved path".to_string()))
    }
}
