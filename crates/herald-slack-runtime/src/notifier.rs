//! Start/upload/finish dispatch for one CI notification step.

use futures_util::future::try_join_all;

use crate::artifacts::{discover_artifact_inventory, ArtifactRef};
use crate::chat_api::{ChatApi, UploadedFile};
use crate::notify_render::{
    render_artifact_pointer, render_finish_message, render_start_message,
};
use crate::run_context::{NotifyMode, RunContext};
use crate::NotifyError;

/// What a completed invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Started {
        channel_id: String,
        thread_ts: String,
    },
    Uploaded {
        screenshots: usize,
        videos: usize,
    },
    NoArtifacts,
    Finished {
        succeeded: bool,
    },
}

impl NotifyOutcome {
    /// Thread timestamp later steps should receive, set only by start.
    pub fn thread_ts(&self) -> Option<&str> {
        match self {
            Self::Started { thread_ts, .. } => Some(thread_ts),
            _ => None,
        }
    }
}

/// Runs the mode selected by `context` against `api`.
pub async fn run_notification(
    api: &dyn ChatApi,
    context: &RunContext,
) -> Result<NotifyOutcome, NotifyError> {
    let thread_ts = context.validate()?;
    let channel_id = resolve_channel_id(api, context.channel_name()).await?;
    tracing::info!(
        channel = context.channel_name(),
        channel_id = %channel_id,
        action = context.mode.as_str(),
        "resolved slack channel"
    );

    match (context.mode, thread_ts) {
        (NotifyMode::Start, _) => announce_start(api, context, channel_id).await,
        (NotifyMode::Upload, Some(thread_ts)) => {
            upload_artifacts(api, context, &channel_id, thread_ts).await
        }
        (NotifyMode::Finish, Some(thread_ts)) => {
            announce_finish(api, context, &channel_id, thread_ts).await
        }
        (mode, None) => Err(NotifyError::Config(format!(
            "thread-id is required for the {} action",
            mode.as_str()
        ))),
    }
}

/// Maps a channel display name to its id with an exact, case-sensitive match.
pub async fn resolve_channel_id(
    api: &dyn ChatApi,
    channel_name: &str,
) -> Result<String, NotifyError> {
    let channels = api.list_channels().await.map_err(|error| {
        NotifyError::ChannelResolution(format!("failed to list channels: {error}"))
    })?;
    channels
        .into_iter()
        .find(|channel| channel.name == channel_name)
        .map(|channel| channel.id)
        .ok_or_else(|| {
            NotifyError::ChannelResolution(format!(
                "channel `{channel_name}` was not found or is not visible to the token"
            ))
        })
}

async fn announce_start(
    api: &dyn ChatApi,
    context: &RunContext,
    channel_id: String,
) -> Result<NotifyOutcome, NotifyError> {
    let posted = api
        .post_message(&channel_id, None, &render_start_message(context))
        .await?;
    tracing::info!(thread_ts = %posted.ts, "posted run start message");
    Ok(NotifyOutcome::Started {
        channel_id,
        thread_ts: posted.ts,
    })
}

async fn announce_finish(
    api: &dyn ChatApi,
    context: &RunContext,
    channel_id: &str,
    thread_ts: &str,
) -> Result<NotifyOutcome, NotifyError> {
    let succeeded = context.succeeded();
    api.update_message(channel_id, thread_ts, &render_finish_message(context))
        .await?;
    tracing::info!(thread_ts, succeeded, "updated run message with final status");
    Ok(NotifyOutcome::Finished { succeeded })
}

async fn upload_artifacts(
    api: &dyn ChatApi,
    context: &RunContext,
    channel_id: &str,
    thread_ts: &str,
) -> Result<NotifyOutcome, NotifyError> {
    let inventory = discover_artifact_inventory(&context.screenshots_dir, &context.videos_dir)?;
    if inventory.is_empty() {
        tracing::info!(
            screenshots = %context.screenshots_dir.display(),
            videos = %context.videos_dir.display(),
            "no artifacts found; nothing to upload"
        );
        return Ok(NotifyOutcome::NoArtifacts);
    }
    tracing::info!(
        screenshots = inventory.screenshots.len(),
        videos = inventory.videos.len(),
        "discovered artifacts"
    );

    api.post_message(
        channel_id,
        Some(thread_ts),
        &render_artifact_pointer(context, &inventory),
    )
    .await?;

    upload_group(api, channel_id, thread_ts, &inventory.screenshots).await?;
    upload_group(api, channel_id, thread_ts, &inventory.videos).await?;

    Ok(NotifyOutcome::Uploaded {
        screenshots: inventory.screenshots.len(),
        videos: inventory.videos.len(),
    })
}

/// Uploads one category concurrently; the first failure abandons the rest.
///
/// Every upload in the group reads its file whole before sending it, so peak
/// memory is roughly the combined size of the group's files.
async fn upload_group(
    api: &dyn ChatApi,
    channel_id: &str,
    thread_ts: &str,
    artifacts: &[ArtifactRef],
) -> Result<(), NotifyError> {
    if artifacts.is_empty() {
        return Ok(());
    }
    let uploaded = try_join_all(
        artifacts
            .iter()
            .map(|artifact| upload_artifact(api, channel_id, thread_ts, artifact)),
    )
    .await?;
    if let Some(first) = artifacts.first() {
        tracing::info!(
            kind = first.kind.as_str(),
            count = uploaded.len(),
            "uploaded artifact group"
        );
    }
    Ok(())
}

async fn upload_artifact(
    api: &dyn ChatApi,
    channel_id: &str,
    thread_ts: &str,
    artifact: &ArtifactRef,
) -> Result<UploadedFile, NotifyError> {
    let bytes = tokio::fs::read(&artifact.path).await.map_err(|error| {
        NotifyError::Artifacts(format!(
            "failed to read {}: {error}",
            artifact.path.display()
        ))
    })?;
    let uploaded = api
        .upload_file(channel_id, thread_ts, &artifact.relative_name, bytes)
        .await?;
    tracing::debug!(
        file = %artifact.relative_name,
        file_id = %uploaded.file_id,
        "uploaded artifact"
    );
    Ok(uploaded)
}
