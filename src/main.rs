mod actions;
mod adapters;
mod config;
mod core;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::actions::{ActionContext, EnvInputs};
use crate::adapters::GitHubClient;
use crate::config::Config;
use crate::pipeline::Outcome;

#[derive(Parser)]
#[command(name = "commitsense")]
#[command(about = "Generate Conventional Commits messages for pull requests and pushes", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, help = "YAML config file (defaults to .commitsense.yml)")]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let runner_debug = std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1");
    let filter = if cli.verbose || runner_debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            actions::set_failed(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.merge_with_inputs(&EnvInputs)?;
    config.normalize();
    let api_key = config.require_api_key()?.to_string();

    let context = ActionContext::from_env()?;
    let change = context.event.change_ref();
    info!(
        "Running for {}/{} in {:?} mode",
        context.owner, context.repo, config.mode
    );

    let github = GitHubClient::new(
        &context.api_url,
        &context.owner,
        &context.repo,
        config.github_token.clone(),
    )?;

    match pipeline::execute(&github, &config, &api_key, &change, &actions::set_output).await? {
        Outcome::NoDiff => info!("Nothing to describe for this event"),
        Outcome::Generated { message, commented } => info!(
            "Finished: {} character message, commented: {}",
            message.chars().count(),
            commented
        ),
    }

    Ok(())
}
