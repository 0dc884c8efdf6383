//! Message rendering for run start, finish and artifact pointer posts.

use serde_json::{json, Value};

use crate::artifacts::ArtifactInventory;
use crate::chat_api::{MessageAttachment, MessageBody};
use crate::run_context::RunContext;
use crate::slack_helpers::truncate_for_slack;

const SLACK_HEADER_MAX_CHARS: usize = 150;
const IN_PROGRESS_STATUS: &str = "In progress";
const UNKNOWN_STATUS: &str = "unknown";

/// Header icon and accent color for a run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

pub const START_STYLE: StatusStyle = StatusStyle {
    icon: ":rocket:",
    color: "#dbab09",
};
pub const SUCCESS_STYLE: StatusStyle = StatusStyle {
    icon: ":white_check_mark:",
    color: "#2eb886",
};
pub const FAILURE_STYLE: StatusStyle = StatusStyle {
    icon: ":poop:",
    color: "#e30d0d",
};

pub fn finish_style(context: &RunContext) -> StatusStyle {
    if context.succeeded() {
        SUCCESS_STYLE
    } else {
        FAILURE_STYLE
    }
}

pub fn render_start_message(context: &RunContext) -> MessageBody {
    render_run_message(context, START_STYLE, IN_PROGRESS_STATUS)
}

pub fn render_finish_message(context: &RunContext) -> MessageBody {
    let status = context
        .status
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_STATUS);
    render_run_message(context, finish_style(context), status)
}

/// Plain-text post that precedes artifact uploads in the thread.
pub fn render_artifact_pointer(context: &RunContext, inventory: &ArtifactInventory) -> MessageBody {
    MessageBody::plain(format!(
        "{} test artifacts for this run: {} screenshot(s), {} video(s)",
        mention_handle(&context.author),
        inventory.screenshots.len(),
        inventory.videos.len()
    ))
}

pub(crate) fn mention_handle(author: &str) -> String {
    format!("@{}", author.trim().trim_start_matches('@'))
}

fn render_run_message(context: &RunContext, style: StatusStyle, status: &str) -> MessageBody {
    let header = truncate_for_slack(
        &format!("{} {}", style.icon, context.message_text.trim()),
        SLACK_HEADER_MAX_CHARS,
    );
    let blocks = vec![
        json!({
            "type": "header",
            "text": {"type": "plain_text", "text": header, "emoji": true},
        }),
        json!({
            "type": "section",
            "fields": [
                mrkdwn_field("Run URL", &run_link_markdown(context)),
                mrkdwn_field("Status", status),
                mrkdwn_field("Author", &mention_handle(&context.author)),
            ],
        }),
    ];
    MessageBody {
        text: format!("{header}: {status}"),
        attachments: vec![MessageAttachment {
            color: style.color.to_string(),
            blocks,
        }],
    }
}

/// `<url|run_id>`; the URL only exists when the run id is known.
fn run_link_markdown(context: &RunContext) -> String {
    match (context.run_link.url(), context.run_link.run_id.as_deref()) {
        (Some(url), Some(run_id)) => format!("<{url}|{run_id}>"),
        _ => "_unavailable_".to_string(),
    }
}

fn mrkdwn_field(title: &str, value: &str) -> Value {
    json!({"type": "mrkdwn", "text": format!("*{title}*\n{value}")})
}
