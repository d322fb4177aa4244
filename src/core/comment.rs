use anyhow::{Context, Result};

use crate::adapters::RepoHost;

const COMMENT_HEADING: &str = "### Suggested commit message";

/// Renders the message so it displays verbatim in the pull request thread.
pub fn format_comment_body(message: &str) -> String {
    let fence = code_fence_for(message);
    format!("{}\n\n{}\n{}\n{}\n", COMMENT_HEADING, fence, message, fence)
}

// A fence longer than any backtick run in the message keeps it from closing early.
fn code_fence_for(message: &str) -> String {
    let longest_run = message
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest_run.max(2) + 1)
}

/// Posts `message` as a new comment on pull request `number`.
pub async fn post_comment(host: &dyn RepoHost, number: u64, message: &str) -> Result<()> {
    host.create_comment(number, &format_comment_body(message))
        .await
        .with_context(|| format!("Failed to comment on pull request #{}", number))
}
