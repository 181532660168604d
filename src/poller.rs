//! Job polling module
//!
//! A scrape job runs in the background on the server with no notification
//! channel, so its progress is observed by polling `/api/job` at a fixed
//! cadence until the job reaches a terminal state.

use crate::api::{ApiError, Artifacts, Backend, JobSnapshot};
use std::fmt;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Delay between two status requests for the same job
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// A scrape job accepted by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Opaque identifier issued by the server
    pub id: String,
    /// Path of the item being scraped
    pub target_path: String,
}

/// Lifecycle state of a job as seen by the poller
///
/// `Running` is the only non-terminal state. Once any other state is
/// reached no further status requests are made for the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// The server still works on the job
    Running(Artifacts),
    /// Poster, NFO and fanart were all produced
    CompletedFull,
    /// One or two of the three artifacts were produced
    CompletedPartial(Artifacts),
    /// The job finished without producing anything
    CompletedNone,
    /// A status request failed or returned an unusable payload
    NetworkError(String),
}

impl JobState {
    /// Classifies the artifacts left behind by a finished job
    pub fn completed(artifacts: Artifacts) -> Self {
        match artifacts.count() {
            3 => JobState::CompletedFull,
            0 => JobState::CompletedNone,
            _ => JobState::CompletedPartial(artifacts),
        }
    }

    /// Applies the outcome of one status request
    pub fn from_poll(result: Result<JobSnapshot, ApiError>) -> Self {
        match result {
            Ok(snapshot) if snapshot.running => JobState::Running(snapshot.artifacts),
            Ok(snapshot) => JobState::completed(snapshot.artifacts),
            Err(e) => JobState::NetworkError(e.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Running(_))
    }

    /// Whether the job finished on the server (as opposed to being lost)
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            JobState::CompletedFull | JobState::CompletedPartial(_) | JobState::CompletedNone
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running(artifacts) => {
                let mark = |present: bool| if present { "✓" } else { "…" };
                write!(
                    f,
                    "scraping... poster{} NFO{} fanart{}",
                    mark(artifacts.poster),
                    mark(artifacts.nfo),
                    mark(artifacts.fanart)
                )
            }
            JobState::CompletedFull => f.write_str("✅ scrape complete"),
            JobState::CompletedPartial(_) => f.write_str("⚠️ some files are missing"),
            JobState::CompletedNone => f.write_str("❌ no files were generated"),
            JobState::NetworkError(_) => f.write_str("❌ network error, please retry"),
        }
    }
}

/// Follows one job until it reaches a terminal state.
///
/// The first status request is issued immediately, then one every
/// [`POLL_INTERVAL`]. A slow request delays the following tick instead of
/// queueing extra requests. Dropping the future returned by [`JobPoller::run`]
/// cancels polling.
pub struct JobPoller<'a, B: Backend + ?Sized> {
    backend: &'a B,
    job: Job,
}

impl<'a, B: Backend + ?Sized> JobPoller<'a, B> {
    pub fn new(backend: &'a B, job: Job) -> Self {
        Self { backend, job }
    }

    /// Polls until terminal, reporting every observed state to `on_update`.
    ///
    /// Returns the terminal state. The interval timer is owned by this
    /// future and released when it returns or is dropped.
    pub async fn run<F>(self, mut on_update: F) -> JobState
    where
        F: FnMut(&JobState),
    {
        let mut ticker = time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut polls = 0usize;

        loop {
            ticker.tick().await;
            polls += 1;

            let state = JobState::from_poll(self.backend.job_status(&self.job.id).await);
            debug!(job = %self.job.id, polls, ?state, "polled job");
            on_update(&state);

            if state.is_terminal() {
                match &state {
                    JobState::NetworkError(reason) => {
                        warn!(job = %self.job.id, polls, reason = %reason, "job polling failed")
                    }
                    _ => info!(job = %self.job.id, polls, ?state, "job finished"),
                }
                return state;
            }
        }
    }
}
