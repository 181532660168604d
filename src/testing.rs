//! Scripted backend used by the workflow tests.

use crate::api::{
    ApiError, Artifacts, Backend, Item, JobSnapshot, MediaId, MetadataPreview, ScrapeAccepted,
    SearchResultCandidate, SubtitleCandidate, SubtitleLanguage,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A request received by [`ScriptedBackend`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Scan(String),
    Search(String, Option<String>),
    Scrape(String, MediaId),
    Poll(String),
    SubtitleSearch(String),
    Download(String, MediaId, SubtitleLanguage),
}

/// Backend answering from per-endpoint queues and recording every call.
///
/// An endpoint without a queued answer fails with a transport error.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    scans: Mutex<VecDeque<Result<Vec<Item>, ApiError>>>,
    searches: Mutex<VecDeque<Result<Vec<SearchResultCandidate>, ApiError>>>,
    scrapes: Mutex<VecDeque<Result<ScrapeAccepted, ApiError>>>,
    polls: Mutex<VecDeque<Result<JobSnapshot, ApiError>>>,
    subtitle_searches: Mutex<VecDeque<Result<Vec<SubtitleCandidate>, ApiError>>>,
    downloads: Mutex<VecDeque<Result<String, ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub fn with_scan(self, answer: Result<Vec<Item>, ApiError>) -> Self {
        self.scans.lock().unwrap().push_back(answer);
        self
    }

    pub fn with_search(self, answer: Result<Vec<SearchResultCandidate>, ApiError>) -> Self {
        self.searches.lock().unwrap().push_back(answer);
        self
    }

    pub fn with_scrape(self, answer: Result<ScrapeAccepted, ApiError>) -> Self {
        self.scrapes.lock().unwrap().push_back(answer);
        self
    }

    pub fn with_poll(self, answer: Result<JobSnapshot, ApiError>) -> Self {
        self.polls.lock().unwrap().push_back(answer);
        self
    }

    pub fn with_subtitle_search(self, answer: Result<Vec<SubtitleCandidate>, ApiError>) -> Self {
        self.subtitle_searches.lock().unwrap().push_back(answer);
        self
    }

    pub fn with_download(self, answer: Result<String, ApiError>) -> Self {
        self.downloads.lock().unwrap().push_back(answer);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.count(|call| matches!(call, Call::Poll(_)))
    }

    pub fn count(&self, filter: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| filter(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>, endpoint: &str) -> Result<T, ApiError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(ApiError::Transport(format!("unscripted {endpoint} call"))))
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn scan(&self, root: &str) -> Result<Vec<Item>, ApiError> {
        self.record(Call::Scan(root.to_string()));
        next(&self.scans, "scan")
    }

    async fn search_movies(
        &self,
        query: &str,
        year: Option<&str>,
    ) -> Result<Vec<SearchResultCandidate>, ApiError> {
        self.record(Call::Search(query.to_string(), year.map(str::to_string)));
        next(&self.searches, "search")
    }

    async fn start_scrape(
        &self,
        path: &str,
        tmdb_id: &MediaId,
    ) -> Result<ScrapeAccepted, ApiError> {
        self.record(Call::Scrape(path.to_string(), tmdb_id.clone()));
        next(&self.scrapes, "scrape")
    }

    async fn job_status(&self, job_id: &str) -> Result<JobSnapshot, ApiError> {
        self.record(Call::Poll(job_id.to_string()));
        next(&self.polls, "job")
    }

    async fn search_subtitles(&self, query: &str) -> Result<Vec<SubtitleCandidate>, ApiError> {
        self.record(Call::SubtitleSearch(query.to_string()));
        next(&self.subtitle_searches, "subtitle search")
    }

    async fn download_subtitle(
        &self,
        path: &str,
        sub_id: &MediaId,
        lang: SubtitleLanguage,
    ) -> Result<String, ApiError> {
        self.record(Call::Download(path.to_string(), sub_id.clone(), lang));
        next(&self.downloads, "subtitle download")
    }
}

pub(crate) fn item(path: &str, poster: bool, nfo: bool, fanart: bool) -> Item {
    let name = path.rsplit('/').next().unwrap_or(path).to_string();
    Item {
        path: path.to_string(),
        name,
        has_poster: poster,
        has_nfo: nfo,
        has_fanart: fanart,
    }
}

pub(crate) fn snapshot(running: bool, poster: bool, nfo: bool, fanart: bool) -> JobSnapshot {
    JobSnapshot {
        running,
        artifacts: Artifacts {
            poster,
            nfo,
            fanart,
        },
    }
}

pub(crate) fn candidate(id: i64, title: &str, release_date: &str) -> SearchResultCandidate {
    SearchResultCandidate {
        id: MediaId::Number(id),
        title: title.to_string(),
        release_date: Some(release_date.to_string()),
        overview: None,
        poster_url: None,
    }
}

pub(crate) fn accepted(job_id: &str, title: &str) -> ScrapeAccepted {
    ScrapeAccepted {
        info: MetadataPreview {
            title: Some(title.to_string()),
            ..MetadataPreview::default()
        },
        job_id: job_id.to_string(),
    }
}

pub(crate) fn subtitles(count: usize) -> Vec<SubtitleCandidate> {
    (0..count)
        .map(|i| SubtitleCandidate {
            id: MediaId::Number(100 + i as i64),
            release_label: format!("Release.{i}"),
            language: "简体".to_string(),
            description: None,
            files_count: None,
        })
        .collect()
}
