//! Subtitle acquisition module
//!
//! This module searches the subtitle catalogue, lets the user pick one of
//! the offered candidates through a [`SelectionPort`] and downloads the
//! chosen subtitle next to the targeted media file.

use crate::WorkflowError;
use crate::api::{Backend, Item, SubtitleCandidate, SubtitleLanguage};
use async_trait::async_trait;
use tracing::{debug, info};

/// Number of subtitle candidates offered for selection
pub const MAX_SUBTITLE_CHOICES: usize = 10;

/// Answer of a [`SelectionPort`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Raw, 1-based answer as entered by the user
    Answer(String),
    /// The user backed out; the download is abandoned
    Cancelled,
}

/// Trait for asking the user to pick one of several subtitle candidates
///
/// Implementors may block on a terminal prompt, show a dialog or answer
/// without any user at all. The answer is interpreted leniently, see
/// [`clamp_choice`].
#[async_trait]
pub trait SelectionPort: Send + Sync {
    async fn select(&self, candidates: &[SubtitleCandidate]) -> Selection;
}

/// Headless port that always gives the same answer
#[derive(Debug, Clone)]
pub struct FixedChoice(pub String);

impl FixedChoice {
    /// Always picks the 1-based position `choice`
    pub fn position(choice: usize) -> Self {
        Self(choice.to_string())
    }
}

#[async_trait]
impl SelectionPort for FixedChoice {
    async fn select(&self, _candidates: &[SubtitleCandidate]) -> Selection {
        Selection::Answer(self.0.clone())
    }
}

/// Turns a raw 1-based answer into a 0-based candidate index
///
/// Leading digits are used (`"3rd"` picks 3). Answers below the valid range
/// or without digits pick the first candidate; answers above it pick the
/// last offered one. Never fails.
pub fn clamp_choice(answer: &str, count: usize) -> usize {
    let upper = count.clamp(1, MAX_SUBTITLE_CHOICES);
    let trimmed = answer.trim();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let digits: String = unsigned
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    let choice = if negative || digits.is_empty() {
        1
    } else {
        // Overflowing input is still "too large"
        digits.parse::<usize>().unwrap_or(usize::MAX)
    };

    choice.clamp(1, upper) - 1
}

/// Numbered menu of the offered candidates, e.g. `[1] Heat.1995 (简体)`
pub fn subtitle_menu(candidates: &[SubtitleCandidate]) -> String {
    candidates
        .iter()
        .take(MAX_SUBTITLE_CHOICES)
        .enumerate()
        .map(|(i, candidate)| {
            format!(
                "[{}] {} ({})",
                i + 1,
                candidate.release_label,
                candidate.language
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A subtitle saved by the server
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSubtitle {
    pub candidate: SubtitleCandidate,
    /// Location of the subtitle file on the server
    pub saved_path: String,
}

/// Subtitle search, selection and download against one backend
pub struct SubtitleSelector<'a, B: Backend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: Backend + ?Sized> SubtitleSelector<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Searches subtitles and returns at most [`MAX_SUBTITLE_CHOICES`] of them
    ///
    /// An empty answer is reported as [`WorkflowError::EmptyResult`].
    pub async fn search(&self, query: &str) -> Result<Vec<SubtitleCandidate>, WorkflowError> {
        if query.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "please enter a search query".to_string(),
            ));
        }

        let mut candidates = self
            .backend
            .search_subtitles(query)
            .await
            .map_err(|e| WorkflowError::from_api(e, "subtitle search failed"))?;

        if candidates.is_empty() {
            return Err(WorkflowError::EmptyResult(
                "no subtitles available".to_string(),
            ));
        }

        debug!(query, found = candidates.len(), "subtitle search completed");
        candidates.truncate(MAX_SUBTITLE_CHOICES);
        Ok(candidates)
    }

    /// Picks the candidate to download
    ///
    /// A single candidate is taken without asking. Otherwise `port` is asked
    /// and its answer clamped into range. `None` means the user cancelled.
    pub async fn resolve_choice(
        &self,
        candidates: &[SubtitleCandidate],
        port: &dyn SelectionPort,
    ) -> Option<usize> {
        match candidates.len() {
            0 => None,
            1 => Some(0),
            count => match port.select(candidates).await {
                Selection::Answer(answer) => Some(clamp_choice(&answer, count)),
                Selection::Cancelled => None,
            },
        }
    }

    /// Downloads `candidate` for `item` in language `lang`
    pub async fn download(
        &self,
        item: &Item,
        candidate: &SubtitleCandidate,
        lang: SubtitleLanguage,
    ) -> Result<SavedSubtitle, WorkflowError> {
        let saved_path = self
            .backend
            .download_subtitle(&item.path, &candidate.id, lang)
            .await
            .map_err(|e| WorkflowError::from_api(e, "subtitle download failed"))?;

        info!(path = %item.path, saved = %saved_path, "subtitle saved");
        Ok(SavedSubtitle {
            candidate: candidate.clone(),
            saved_path,
        })
    }
}
