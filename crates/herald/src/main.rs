mod bootstrap_helpers;
mod step_output;

use anyhow::Result;
use clap::Parser;
use herald_cli::{build_run_context, require_slack_token, slack_client_config, Cli};
use herald_slack_runtime::{run_notification, NotifyOutcome, SlackApiClient};

#[tokio::main]
async fn main() {
    bootstrap_helpers::init_tracing();
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let context = build_run_context(&cli)?;
    let token = require_slack_token(&cli)?;
    let client = SlackApiClient::new(slack_client_config(&cli, token))?;

    let outcome = run_notification(&client, &context).await?;
    match &outcome {
        NotifyOutcome::Started { thread_ts, .. } => {
            step_output::emit_thread_id(cli.github_output.as_deref(), thread_ts)?;
        }
        NotifyOutcome::NoArtifacts => {
            tracing::info!("upload finished without artifacts");
        }
        NotifyOutcome::Uploaded {
            screenshots,
            videos,
        } => {
            tracing::info!(screenshots, videos, "artifact upload complete");
        }
        NotifyOutcome::Finished { succeeded } => {
            tracing::info!(succeeded, "run message finalized");
        }
    }
    Ok(())
}
