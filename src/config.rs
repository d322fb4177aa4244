use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::actions::InputSource;
use crate::adapters::llm::Provider;
use crate::core::diff::MIN_DIFF_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Post the generated message on the pull request as well.
    #[default]
    PrComment,
    /// Only expose the message as a step output.
    CommitSummary,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pr-comment" => Ok(Mode::PrComment),
            "commit-summary" => Ok(Mode::CommitSummary),
            other => anyhow::bail!(
                "Unsupported mode '{}' (expected 'pr-comment' or 'commit-summary')",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: Provider,

    pub model: Option<String>,

    #[serde(default)]
    pub mode: Mode,

    #[serde(default = "default_max_diff_length")]
    pub max_diff_length: usize,

    #[serde(default = "default_language")]
    pub language: String,

    pub custom_prompt: Option<String>,
    pub api_key: Option<String>,
    pub github_token: Option<String>,
    pub base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: None,
            mode: Mode::default(),
            max_diff_length: default_max_diff_length(),
            language: default_language(),
            custom_prompt: None,
            api_key: None,
            github_token: None,
            base_url: None,
        }
    }
}

impl Config {
    /// Loads the YAML config at `path`, or the first default location that exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let mut candidates = vec![
            PathBuf::from(".commitsense.yml"),
            PathBuf::from(".commitsense.yaml"),
        ];
        if let Some(home_dir) = dirs::home_dir() {
            candidates.push(home_dir.join(".commitsense.yml"));
        }

        for candidate in candidates {
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }

        Ok(Config::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Overlays action inputs on top of file values. Blank inputs are ignored.
    pub fn merge_with_inputs(&mut self, inputs: &dyn InputSource) -> Result<()> {
        if let Some(provider) = inputs.input("provider") {
            self.provider = provider.parse()?;
        }
        if let Some(mode) = inputs.input("mode") {
            self.mode = mode.parse()?;
        }
        if let Some(model) = inputs.input("model") {
            self.model = Some(model);
        }
        if let Some(raw) = inputs.input("max-diff-length") {
            self.max_diff_length = parse_max_diff_length(&raw);
        }
        if let Some(language) = inputs.input("language") {
            self.language = language;
        }
        if let Some(prompt) = inputs.input("custom-prompt") {
            self.custom_prompt = Some(prompt);
        }
        if let Some(key) = inputs.input("api-key") {
            self.api_key = Some(key);
        }
        if let Some(token) = inputs.input("github-token") {
            self.github_token = Some(token);
        }
        if let Some(url) = inputs.input("base-url") {
            self.base_url = Some(url);
        }
        Ok(())
    }

    /// Fills secrets from the environment and enforces the diff length floor.
    pub fn normalize(&mut self) {
        self.normalize_with(|key| std::env::var(key).ok());
    }

    fn normalize_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = non_empty(self.provider.api_key_env());
        }
        if self.github_token.is_none() {
            self.github_token = non_empty("GITHUB_TOKEN");
        }
        if self.max_diff_length == 0 {
            self.max_diff_length = default_max_diff_length();
        }
        self.max_diff_length = self.max_diff_length.max(MIN_DIFF_LENGTH);
        self.model = self.model.take().filter(|model| !model.trim().is_empty());
        self.custom_prompt = self
            .custom_prompt
            .take()
            .filter(|prompt| !prompt.trim().is_empty());
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("Input required and not supplied: api-key")
    }
}

/// Reads the leading integer (`"2048px"` is 2048). No digits or zero means the default.
fn parse_max_diff_length(raw: &str) -> usize {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() || digits.bytes().all(|b| b == b'0') {
        return default_max_diff_length();
    }
    if negative {
        return MIN_DIFF_LENGTH;
    }
    digits.parse::<usize>().unwrap_or(usize::MAX)
}

fn default_max_diff_length() -> usize {
    10_000
}

fn default_language() -> String {
    "english".to_string()
}
