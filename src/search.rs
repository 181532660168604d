//! Metadata search session module
//!
//! A search session covers one interaction with the search dialog for a
//! single targeted item: the query, the optional year filter, the result
//! list and finally the chosen candidate that turns into a scrape job.

use crate::WorkflowError;
use crate::api::{Backend, Item, MediaId, MetadataPreview, SearchResultCandidate};
use crate::poller::Job;
use crate::title::{normalize_title, search_text};
use tracing::info;

/// The text and optional year filter of a metadata search
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub text: String,
    pub year: Option<String>,
}

/// Result of choosing a search candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeStarted {
    /// Movie details to show while the job runs
    pub preview: MetadataPreview,
    /// The job to hand to the poller
    pub job: Job,
}

/// State of one search dialog for one targeted item
#[derive(Debug, Clone)]
pub struct SearchSession {
    target: Item,
    query: SearchQuery,
    results: Vec<SearchResultCandidate>,
    open: bool,
}

impl SearchSession {
    /// Opens a session for `item`, seeding the query from its file name
    pub fn open(item: Item) -> Self {
        let query = SearchQuery {
            text: normalize_title(&item.name),
            year: None,
        };

        Self {
            target: item,
            query,
            results: Vec::new(),
            open: true,
        }
    }

    /// The item this session targets
    pub fn target(&self) -> &Item {
        &self.target
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn results(&self) -> &[SearchResultCandidate] {
        &self.results
    }

    /// Whether the dialog is still open (no candidate chosen yet)
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Replaces the query text without searching
    pub fn edit_text(&mut self, text: &str) {
        self.query.text = text.to_string();
    }

    /// Runs a metadata search and replaces the result list
    ///
    /// On failure the previous result list is kept.
    pub async fn submit<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        text: &str,
        year: Option<&str>,
    ) -> Result<&[SearchResultCandidate], WorkflowError> {
        let text = search_text(text);
        if text.is_empty() {
            return Err(WorkflowError::Validation(
                "please enter a search query".to_string(),
            ));
        }

        let year = year
            .map(str::trim)
            .filter(|year| !year.is_empty())
            .map(str::to_string);
        self.query = SearchQuery { text, year };

        let results = backend
            .search_movies(&self.query.text, self.query.year.as_deref())
            .await
            .map_err(|e| WorkflowError::from_api(e, "search failed"))?;

        info!(query = %self.query.text, count = results.len(), "search completed");
        self.results = results;
        Ok(&self.results)
    }

    /// Submits a scrape of the targeted item with the chosen candidate
    ///
    /// Closes the dialog on success and returns the job to follow.
    pub async fn choose<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        candidate_id: &MediaId,
    ) -> Result<ScrapeStarted, WorkflowError> {
        let accepted = backend
            .start_scrape(&self.target.path, candidate_id)
            .await
            .map_err(|e| WorkflowError::from_api(e, "submission failed"))?;

        info!(path = %self.target.path, job = %accepted.job_id, "scrape job submitted");
        self.open = false;

        Ok(ScrapeStarted {
            preview: accepted.info,
            job: Job {
                id: accepted.job_id,
                target_path: self.target.path.clone(),
            },
        })
    }
}

/// One-line label for a search candidate, e.g. `Heat (1995)`
pub fn candidate_label(candidate: &SearchResultCandidate) -> String {
    match candidate.year() {
        Some(year) => format!("{} ({})", candidate.title, year),
        None => candidate.title.clone(),
    }
}

/// Multi-line rendering of the metadata preview shown while a job runs
pub fn render_preview(preview: &MetadataPreview) -> String {
    let genres: Vec<&str> = preview.genres.iter().flatten().map(String::as_str).collect();
    let rating = preview
        .rating
        .filter(|rating| *rating > 0.0)
        .map(|rating| format!("{rating:.1}"))
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "{} ({})\n{}\nRating: {}\n{}",
        preview.title.as_deref().unwrap_or("Unknown title"),
        preview
            .year
            .as_deref()
            .filter(|year| !year.is_empty())
            .unwrap_or("—"),
        genres.join(", "),
        rating,
        preview
            .overview
            .as_deref()
            .filter(|overview| !overview.is_empty())
            .unwrap_or("No overview available")
    )
}
