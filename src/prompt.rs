//! Terminal prompts for the interactive workflow.

use crate::api::{SearchResultCandidate, SubtitleCandidate};
use crate::search::candidate_label;
use crate::subtitle::{MAX_SUBTITLE_CHOICES, Selection, SelectionPort, subtitle_menu};
use async_trait::async_trait;
use dialoguer::{Input, Select};
use tracing::warn;

/// Selection port asking on the terminal
///
/// Shows the numbered candidate menu and reads a position. The input line
/// starts out holding `1`; clearing it or interrupting the prompt cancels
/// the download.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

#[async_trait]
impl SelectionPort for TerminalPrompt {
    async fn select(&self, candidates: &[SubtitleCandidate]) -> Selection {
        let upper = candidates.len().min(MAX_SUBTITLE_CHOICES);
        let prompt = format!(
            "Choose a subtitle:\n{}\n\nEnter 1-{upper}",
            subtitle_menu(candidates)
        );

        // dialoguer reads stdin synchronously
        let answer = tokio::task::spawn_blocking(move || {
            Input::<String>::new()
                .with_prompt(prompt)
                .with_initial_text("1")
                .allow_empty(true)
                .interact_text()
        })
        .await;

        match answer {
            Ok(Ok(text)) => answer_selection(text),
            Ok(Err(e)) => {
                warn!(error = %e, "subtitle prompt failed");
                Selection::Cancelled
            }
            Err(e) => {
                warn!(error = %e, "subtitle prompt task failed");
                Selection::Cancelled
            }
        }
    }
}

/// Maps a typed answer to a selection; a blank answer cancels
fn answer_selection(text: String) -> Selection {
    if text.trim().is_empty() {
        Selection::Cancelled
    } else {
        Selection::Answer(text)
    }
}

/// Lets the user pick one metadata search result
///
/// Returns `Ok(None)` if the user pressed Esc or `q`.
pub fn choose_candidate(
    results: &[SearchResultCandidate],
) -> Result<Option<usize>, dialoguer::Error> {
    let labels: Vec<String> = results.iter().map(candidate_label).collect();

    Select::new()
        .with_prompt("Choose the matching movie (Esc to cancel)")
        .items(&labels)
        .default(0)
        .interact_opt()
}
