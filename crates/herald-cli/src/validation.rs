use std::path::PathBuf;

use herald_slack_runtime::{NotifyError, NotifyMode, RunContext, RunLink, SlackClientConfig};

use crate::cli_args::{Cli, DEFAULT_SCREENSHOTS_DIR, DEFAULT_VIDEOS_DIR};

const DEFAULT_MESSAGE_TEXT: &str = "CI run";

/// Trimmed value, with blank treated as unset.
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn path_or_default(value: Option<&PathBuf>, default: &str) -> PathBuf {
    value
        .filter(|path| !path.as_os_str().is_empty())
        .cloned()
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Builds the immutable run context, rejecting configuration errors up front.
pub fn build_run_context(cli: &Cli) -> Result<RunContext, NotifyError> {
    let mode = non_empty(cli.action.as_deref())
        .ok_or_else(|| NotifyError::Config("--action (INPUT_ACTION) is required".to_string()))?
        .parse::<NotifyMode>()?;
    let channel = non_empty(cli.channel.as_deref())
        .ok_or_else(|| NotifyError::Config("--channel (INPUT_CHANNEL) is required".to_string()))?;
    let author = non_empty(cli.author.as_deref())
        .or_else(|| non_empty(cli.github_actor.as_deref()))
        .ok_or_else(|| {
            NotifyError::Config("--author (INPUT_AUTHOR or GITHUB_ACTOR) is required".to_string())
        })?;

    let context = RunContext {
        mode,
        channel,
        message_text: non_empty(cli.message_text.as_deref())
            .unwrap_or_else(|| DEFAULT_MESSAGE_TEXT.to_string()),
        author,
        status: non_empty(cli.status.as_deref()),
        thread_ts: non_empty(cli.thread_id.as_deref()),
        screenshots_dir: path_or_default(cli.screenshots.as_ref(), DEFAULT_SCREENSHOTS_DIR),
        videos_dir: path_or_default(cli.videos.as_ref(), DEFAULT_VIDEOS_DIR),
        run_link: RunLink {
            server_url: cli.github_server_url.clone(),
            repository: non_empty(cli.github_repository.as_deref()),
            run_id: non_empty(cli.github_run_id.as_deref()),
        },
    };
    context.validate()?;
    Ok(context)
}

pub fn require_slack_token(cli: &Cli) -> Result<String, NotifyError> {
    non_empty(cli.token.as_deref())
        .ok_or_else(|| NotifyError::Config("--token (INPUT_TOKEN) is required".to_string()))
}

pub fn slack_client_config(cli: &Cli, bot_token: String) -> SlackClientConfig {
    SlackClientConfig {
        api_base: cli.slack_api_base.clone(),
        bot_token,
        request_timeout_ms: cli.request_timeout_ms,
        retry_max_attempts: cli.retry_max_attempts,
        retry_base_delay_ms: cli.retry_base_delay_ms,
    }
}
