//! Workflow orchestration module
//!
//! The orchestrator wires user actions (scan, open search, submit search,
//! choose a result, request subtitles) to the inventory, the search session,
//! the job poller and the subtitle selector. It owns the session of the
//! currently targeted item; actions that need a target fail with
//! [`WorkflowError::NoTarget`] while none is open.

use crate::WorkflowError;
use crate::api::{Backend, Item, MediaId, SearchResultCandidate, SubtitleLanguage};
use crate::inventory::InventoryView;
use crate::poller::{Job, JobPoller, JobState};
use crate::search::{ScrapeStarted, SearchSession};
use crate::subtitle::{SavedSubtitle, SelectionPort, SubtitleSelector};
use crate::title::subtitle_query;
use std::collections::HashSet;
use tracing::{info, warn};

/// Final outcome of following a job
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    /// The terminal state of the job
    pub state: JobState,
    /// The item as re-read from the server, if the job completed and the
    /// item could still be found
    pub refreshed: Option<Item>,
}

/// Clears the pending mark of an item on every path out of polling
struct PendingGuard<'a> {
    pending: &'a mut HashSet<String>,
    path: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.path);
    }
}

/// Drives the interactive scrape and subtitle workflows for one user
pub struct Orchestrator<B: Backend> {
    backend: B,
    inventory: InventoryView,
    session: Option<SearchSession>,
    /// Paths with a submitted job that has not reached a terminal state
    pending: HashSet<String>,
    language: SubtitleLanguage,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            inventory: InventoryView::new(),
            session: None,
            pending: HashSet::new(),
            language: SubtitleLanguage::default(),
        }
    }

    /// Sets the language requested for subtitle downloads
    pub fn with_language(mut self, language: SubtitleLanguage) -> Self {
        self.language = language;
        self
    }

    pub fn inventory(&self) -> &InventoryView {
        &self.inventory
    }

    /// The session of the targeted item, if any
    pub fn session(&self) -> Option<&SearchSession> {
        self.session.as_ref()
    }

    /// Whether a job for `path` is still being followed
    pub fn is_pending(&self, path: &str) -> bool {
        self.pending.contains(path)
    }

    /// Scans `root`, replacing the inventory
    pub async fn scan(&mut self, root: &str) -> Result<&[Item], WorkflowError> {
        self.inventory.scan(&self.backend, root).await
    }

    /// Targets the item at `path` and opens a fresh search session for it
    ///
    /// Any previous session, including its results, is discarded. A job for
    /// the item that was submitted but never followed no longer blocks a new
    /// submission; `follow` borrows the orchestrator, so none can be running.
    pub fn open_search(&mut self, path: &str) -> Result<&SearchSession, WorkflowError> {
        let item = self
            .inventory
            .get(path)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound(path.to_string()))?;

        if self.pending.remove(path) {
            warn!(path, "dropping pending mark of a job that was never followed");
        }
        info!(path, "search session opened");
        Ok(self.session.insert(SearchSession::open(item)))
    }

    /// Replaces the search text of the targeted item without searching
    pub fn edit_query(&mut self, text: &str) -> Result<(), WorkflowError> {
        self.session
            .as_mut()
            .ok_or(WorkflowError::NoTarget)?
            .edit_text(text);
        Ok(())
    }

    /// Runs a metadata search for the targeted item
    pub async fn submit_search(
        &mut self,
        text: &str,
        year: Option<&str>,
    ) -> Result<&[SearchResultCandidate], WorkflowError> {
        let session = self.session.as_mut().ok_or(WorkflowError::NoTarget)?;
        session.submit(&self.backend, text, year).await
    }

    /// Submits a scrape job for the targeted item with the chosen candidate
    ///
    /// Rejected with [`WorkflowError::JobPending`] while an earlier job for
    /// the same item is still pending. Pass the returned job to
    /// [`Orchestrator::follow`]; the mark is cleared when following ends or
    /// when a new search session is opened for the item.
    pub async fn choose(&mut self, candidate_id: &MediaId) -> Result<ScrapeStarted, WorkflowError> {
        let session = self.session.as_mut().ok_or(WorkflowError::NoTarget)?;

        let path = session.target().path.clone();
        if self.pending.contains(&path) {
            return Err(WorkflowError::JobPending(path));
        }

        let started = session.choose(&self.backend, candidate_id).await?;
        self.pending.insert(path);
        Ok(started)
    }

    /// Polls `job` until it is terminal, then reconciles its item
    ///
    /// `on_update` sees every polled state, including the terminal one.
    /// Only a job that finished on the server triggers the refresh; a
    /// network error leaves the inventory untouched.
    pub async fn follow<F>(&mut self, job: &Job, on_update: F) -> JobReport
    where
        F: FnMut(&JobState),
    {
        let Self {
            backend,
            inventory,
            pending,
            ..
        } = self;

        let state = {
            let _guard = PendingGuard {
                pending,
                path: job.target_path.clone(),
            };
            JobPoller::new(&*backend, job.clone()).run(on_update).await
        };

        let refreshed = if state.is_completed() {
            match inventory.refresh_one(&*backend, &job.target_path).await {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(path = %job.target_path, error = %e, "could not refresh item");
                    None
                }
            }
        } else {
            None
        };

        JobReport { state, refreshed }
    }

    /// Searches, selects and downloads a subtitle for the targeted item
    ///
    /// The query is the session's search text without a parenthesized year.
    /// Returns `Ok(None)` when the user cancelled the selection.
    pub async fn request_subtitles(
        &self,
        port: &dyn SelectionPort,
    ) -> Result<Option<SavedSubtitle>, WorkflowError> {
        let session = self.session.as_ref().ok_or(WorkflowError::NoTarget)?;
        let selector = SubtitleSelector::new(&self.backend);

        let candidates = selector.search(&subtitle_query(&session.query().text)).await?;
        let Some(index) = selector.resolve_choice(&candidates, port).await else {
            info!(path = %session.target().path, "subtitle selection cancelled");
            return Ok(None);
        };

        selector
            .download(session.target(), &candidates[index], self.language)
            .await
            .map(Some)
    }
}
