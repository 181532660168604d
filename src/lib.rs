//! mediamm pilot - Drive media scraping jobs against a mediamm server
//!
//! This library provides the client-side workflow of the mediamm media
//! manager: scanning a library root, searching metadata for one item,
//! submitting a scrape job and following it until it finishes, and fetching
//! subtitles for the same item.

mod api;
mod config;
mod inventory;
pub mod logging;
mod orchestrator;
mod poller;
mod prompt;
mod search;
mod subtitle;
mod title;

#[cfg(test)]
mod testing;

// Re-export error types
pub use api::ApiError;
pub use config::ConfigError;

// Re-export the backend contract
pub use api::{
    Artifacts, Backend, HttpBackend, Item, JobSnapshot, MediaId, MetadataPreview,
    ScrapeAccepted, SearchResultCandidate, SubtitleCandidate, SubtitleLanguage,
};

// Re-export workflow components
pub use config::Settings;
pub use inventory::InventoryView;
pub use orchestrator::{JobReport, Orchestrator};
pub use poller::{Job, JobPoller, JobState, POLL_INTERVAL};
pub use prompt::{TerminalPrompt, choose_candidate};
pub use search::{ScrapeStarted, SearchQuery, SearchSession, candidate_label, render_preview};
pub use subtitle::{
    FixedChoice, MAX_SUBTITLE_CHOICES, SavedSubtitle, Selection, SelectionPort,
    SubtitleSelector, clamp_choice, subtitle_menu,
};
pub use title::{normalize_title, search_text, subtitle_query};

use thiserror::Error;

/// Failure of a user action, reported to the user as is
///
/// Every variant carries the most specific message available. None of them
/// changes previously shown state except where the action documents it.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A required input was empty
    #[error("{0}")]
    Validation(String),

    /// The action needs a targeted item but no search session is open
    #[error("No item selected")]
    NoTarget,

    /// The server answered with `ok: false`
    #[error("{0}")]
    Backend(String),

    /// The request failed or the answer could not be understood
    #[error("Network error: {0}")]
    Transport(String),

    /// The search succeeded but found nothing
    #[error("{0}")]
    EmptyResult(String),

    /// The item is not part of the inventory
    #[error("Item not found: {0}")]
    NotFound(String),

    /// A scrape job for the item is still being followed
    #[error("A scrape job is already running for {0}")]
    JobPending(String),
}

impl WorkflowError {
    /// Converts a backend failure, using `fallback` when the server gave no reason
    pub(crate) fn from_api(error: ApiError, fallback: &str) -> Self {
        match error {
            ApiError::Rejected(Some(message)) => WorkflowError::Backend(message),
            ApiError::Rejected(None) => WorkflowError::Backend(fallback.to_string()),
            ApiError::Transport(message) | ApiError::Malformed(message) => {
                WorkflowError::Transport(message)
            }
        }
    }
}

/// Top-level error type for mediamm pilot operations
#[derive(Debug, Error)]
pub enum PilotError {
    /// Error while loading or saving settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error while setting up the backend connection
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// A user action failed
    #[error("{0}")]
    Workflow(#[from] WorkflowError),

    /// The terminal prompt could not be shown
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_api_prefers_backend_message() {
        let error = WorkflowError::from_api(ApiError::Rejected(Some("目录不存在".into())), "scan failed");
        assert_eq!(error.to_string(), "目录不存在");
    }

    #[test]
    fn test_from_api_falls_back_to_generic_message() {
        let error = WorkflowError::from_api(ApiError::Rejected(None), "scan failed");
        assert_eq!(error.to_string(), "scan failed");
    }

    #[test]
    fn test_from_api_transport_and_malformed() {
        assert!(matches!(
            WorkflowError::from_api(ApiError::Transport("HTTP 502".into()), "x"),
            WorkflowError::Transport(_)
        ));
        assert!(matches!(
            WorkflowError::from_api(ApiError::Malformed("eof".into()), "x"),
            WorkflowError::Transport(_)
        ));
    }
}
