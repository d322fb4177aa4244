use anyhow::Result;
use tracing::info;

use crate::actions;
use crate::adapters::RepoHost;
use crate::config::{Config, Mode};
use crate::core::{fetch_diff, generate, post_comment, ChangeRef, GenerationRequest};

/// How a run ended.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    NoDiff,
    Generated { message: String, commented: bool },
}

/// Runs one pass: diff, message, `message` output, then the optional comment.
///
/// `set_output` receives every step output before any comment is posted.
pub async fn execute(
    host: &dyn RepoHost,
    config: &Config,
    api_key: &str,
    change: &ChangeRef,
    set_output: &dyn Fn(&str, &str) -> Result<()>,
) -> Result<Outcome> {
    let Some(diff) = fetch_diff(host, change, config.max_diff_length).await? else {
        actions::warning("No diff found. Skipping AI message generation.");
        set_output("message", "")?;
        return Ok(Outcome::NoDiff);
    };

    let request = GenerationRequest {
        provider: config.provider,
        model: config.model.clone(),
        diff,
        language: config.language.clone(),
        custom_prompt: config.custom_prompt.clone(),
    };
    let message = generate(&request, api_key, config.base_url.clone()).await?;

    set_output("message", &message)?;
    info!("Generated message:\n{}", message);

    let mut commented = false;
    if config.mode == Mode::PrComment {
        if let Some(number) = change.pull_request_number() {
            post_comment(host, number, &message).await?;
            info!("Posted PR comment.");
            commented = true;
        }
    }

    Ok(Outcome::Generated { message, commented })
}
