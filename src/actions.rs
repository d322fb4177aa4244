//! GitHub Actions runtime plumbing: inputs, event context, outputs and
//! workflow commands.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::adapters::github::DEFAULT_API_URL;
use crate::core::ChangeRef;

/// A source of named action inputs.
pub trait InputSource {
    fn input(&self, name: &str) -> Option<String>;
}

/// Reads inputs the way the runner passes them: `INPUT_<NAME>` variables.
pub struct EnvInputs;

impl InputSource for EnvInputs {
    fn input(&self, name: &str) -> Option<String> {
        let key = format!("INPUT_{}", name.replace(' ', "_").to_uppercase());
        std::env::var(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[cfg(test)]
impl InputSource for std::collections::HashMap<String, String> {
    fn input(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EventPayload {
    pub pull_request: Option<PullRequestEvent>,
    #[serde(default)]
    pub commits: Vec<CommitEvent>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestEvent {
    pub number: u64,
}

#[derive(Debug, Deserialize)]
pub struct CommitEvent {
    pub id: String,
}

impl EventPayload {
    pub fn change_ref(&self) -> ChangeRef {
        if let Some(pr) = &self.pull_request {
            ChangeRef::PullRequest(pr.number)
        } else if !self.commits.is_empty() {
            ChangeRef::Commits(self.commits.iter().map(|c| c.id.clone()).collect())
        } else {
            ChangeRef::Empty
        }
    }
}

#[derive(Debug)]
pub struct ActionContext {
    pub owner: String,
    pub repo: String,
    pub api_url: String,
    pub event: EventPayload,
}

impl ActionContext {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let repository = lookup("GITHUB_REPOSITORY").context("GITHUB_REPOSITORY is not set")?;
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
            .with_context(|| {
                format!("GITHUB_REPOSITORY must look like owner/repo, got '{}'", repository)
            })?;

        let api_url = lookup("GITHUB_API_URL")
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let event = match lookup("GITHUB_EVENT_PATH").filter(|path| !path.is_empty()) {
            Some(path) => load_event(Path::new(&path))?,
            None => EventPayload::default(),
        };

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            api_url,
            event,
        })
    }
}

fn load_event(path: &Path) -> Result<EventPayload> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse event payload {}", path.display()))
}

/// Sets a step output, falling back to a log line outside of a runner.
pub fn set_output(name: &str, value: &str) -> Result<()> {
    match std::env::var("GITHUB_OUTPUT").ok().filter(|p| !p.is_empty()) {
        Some(path) => write_output(Path::new(&path), name, value),
        None => {
            info!("Output {}={}", name, value);
            Ok(())
        }
    }
}

pub fn write_output(path: &Path, name: &str, value: &str) -> Result<()> {
    let delimiter = output_delimiter(value);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output file {}", path.display()))?;
    write!(file, "{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
        .with_context(|| format!("Failed to write output '{}'", name))
}

fn output_delimiter(value: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut delimiter = format!("ghadelimiter_{}_{}", std::process::id(), nanos);
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    delimiter
}

pub fn warning(message: &str) {
    println!("::warning::{}", escape_data(message));
}

pub fn set_failed(message: &str) {
    println!("::error::{}", escape_data(message));
}

fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
