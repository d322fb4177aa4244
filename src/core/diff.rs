use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::RepoHost;

/// Lower bound applied to any configured maximum diff length.
pub const MIN_DIFF_LENGTH: usize = 1000;

/// Appended after the cut when a diff exceeds the maximum length.
pub const TRUNCATION_MARKER: &str = "\n\n... (diff truncated)";

/// What a run is about, as derived from the triggering event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeRef {
    PullRequest(u64),
    Commits(Vec<String>),
    Empty,
}

impl ChangeRef {
    pub fn pull_request_number(&self) -> Option<u64> {
        match self {
            ChangeRef::PullRequest(number) => Some(*number),
            _ => None,
        }
    }
}

/// Retrieves the diff for `change`, truncated to `max_length` characters.
///
/// Returns `Ok(None)` when there is nothing to describe: no pull request, no
/// commits, or an empty diff. `max_length` is raised to [`MIN_DIFF_LENGTH`] if lower.
pub async fn fetch_diff(
    host: &dyn RepoHost,
    change: &ChangeRef,
    max_length: usize,
) -> Result<Option<String>> {
    let max_length = max_length.max(MIN_DIFF_LENGTH);

    let raw = match change {
        ChangeRef::PullRequest(number) => {
            info!("Fetching diff for pull request #{}", number);
            host.pull_request_diff(*number)
                .await
                .with_context(|| format!("Failed to fetch diff for pull request #{}", number))?
        }
        ChangeRef::Commits(shas) if !shas.is_empty() => {
            info!("Fetching diffs for {} pushed commit(s)", shas.len());
            let mut diffs = Vec::with_capacity(shas.len());
            for sha in shas {
                debug!("Fetching diff for commit {}", sha);
                let diff = host
                    .commit_diff(sha)
                    .await
                    .with_context(|| format!("Failed to fetch diff for commit {}", sha))?;
                diffs.push(diff);
            }
            diffs.join("\n")
        }
        ChangeRef::Commits(_) | ChangeRef::Empty => return Ok(None),
    };

    if raw.is_empty() {
        info!("Diff is empty");
        return Ok(None);
    }

    let length = raw.chars().count();
    if length > max_length {
        info!(
            "Diff is {} characters, truncating to {}",
            length, max_length
        );
    } else {
        debug!("Diff is {} characters", length);
    }

    Ok(Some(truncate_diff(raw, max_length)))
}

/// Cuts `diff` to its first `max_length` characters and appends
/// [`TRUNCATION_MARKER`]. Diffs within the limit are returned unchanged.
pub fn truncate_diff(diff: String, max_length: usize) -> String {
    match diff.char_indices().nth(max_length) {
        Some((cut, _)) => {
            let mut truncated = diff;
            truncated.truncate(cut);
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
        None => diff,
    }
}
