use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_SCREENSHOTS_DIR: &str = "cypress/screenshots";
pub const DEFAULT_VIDEOS_DIR: &str = "cypress/videos";

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "herald",
    about = "Post CI run status and test artifacts to a Slack thread",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "INPUT_ACTION",
        help = "Step to run: start, upload or finish (case-insensitive)"
    )]
    pub action: Option<String>,

    #[arg(
        long,
        env = "INPUT_TOKEN",
        hide_env_values = true,
        help = "Slack bot token (xoxb-...) used for every API call"
    )]
    pub token: Option<String>,

    #[arg(
        long,
        env = "INPUT_CHANNEL",
        help = "Slack channel name to post into; a leading # is ignored"
    )]
    pub channel: Option<String>,

    #[arg(
        long,
        env = "INPUT_AUTHOR",
        help = "Handle mentioned in run and artifact messages"
    )]
    pub author: Option<String>,

    #[arg(
        long,
        env = "INPUT_SCREENSHOTS",
        help = "Root directory searched for screenshots [default: cypress/screenshots]"
    )]
    pub screenshots: Option<PathBuf>,

    #[arg(
        long,
        env = "INPUT_VIDEOS",
        help = "Root directory searched for videos [default: cypress/videos]"
    )]
    pub videos: Option<PathBuf>,

    #[arg(
        long = "message-text",
        env = "INPUT_MESSAGE-TEXT",
        help = "Header text for the run message"
    )]
    pub message_text: Option<String>,

    #[arg(
        long = "thread-id",
        env = "INPUT_THREAD-ID",
        help = "Timestamp of the run message; required for upload and finish"
    )]
    pub thread_id: Option<String>,

    #[arg(
        long,
        env = "INPUT_STATUS",
        help = "Reported run status for finish; only `success` counts as passing"
    )]
    pub status: Option<String>,

    #[arg(
        long = "github-server-url",
        env = "GITHUB_SERVER_URL",
        default_value = "https://github.com",
        help = "CI server base URL used for the run link"
    )]
    pub github_server_url: String,

    #[arg(
        long = "github-repository",
        env = "GITHUB_REPOSITORY",
        help = "Repository (owner/name) used for the run link"
    )]
    pub github_repository: Option<String>,

    #[arg(
        long = "github-run-id",
        env = "GITHUB_RUN_ID",
        help = "Workflow run id used for the run link"
    )]
    pub github_run_id: Option<String>,

    #[arg(
        long = "github-actor",
        env = "GITHUB_ACTOR",
        help = "Fallback author handle when --author is not set"
    )]
    pub github_actor: Option<String>,

    #[arg(
        long = "github-output",
        env = "GITHUB_OUTPUT",
        help = "Step output file that receives thread-id after start"
    )]
    pub github_output: Option<PathBuf>,

    #[arg(
        long = "slack-api-base",
        env = "HERALD_SLACK_API_BASE",
        default_value = "https://slack.com/api",
        help = "Slack Web API base URL"
    )]
    pub slack_api_base: String,

    #[arg(
        long = "request-timeout-ms",
        env = "HERALD_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Timeout for each Slack API request in milliseconds"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        env = "HERALD_RETRY_MAX_ATTEMPTS",
        default_value_t = 3,
        value_parser = parse_positive_usize,
        help = "Attempts per Slack request on rate limits, 5xx and transport errors"
    )]
    pub retry_max_attempts: usize,

    #[arg(
        long = "retry-base-delay-ms",
        env = "HERALD_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        value_parser = parse_positive_u64,
        help = "Base delay for exponential Slack request backoff"
    )]
    pub retry_base_delay_ms: u64,
}
