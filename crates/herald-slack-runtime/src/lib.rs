//! Slack runtime for herald CI run notifications.
//!
//! Hosts the Slack Web API client, the [`ChatApi`] seam the notifier talks
//! through, artifact discovery, message rendering, and the start/upload/finish
//! dispatch that ties them together.

pub mod artifacts;
pub mod chat_api;
pub mod error;
pub mod notifier;
pub mod notify_render;
pub mod run_context;
pub mod slack_api_client;
mod slack_helpers;

pub use artifacts::{
    discover_artifact_inventory, discover_artifacts, ArtifactInventory, ArtifactKind, ArtifactRef,
};
pub use chat_api::{
    ChatApi, MessageAttachment, MessageBody, PostedMessage, SlackChannel, UploadedFile,
};
pub use error::NotifyError;
pub use notifier::{resolve_channel_id, run_notification, NotifyOutcome};
pub use run_context::{NotifyMode, RunContext, RunLink};
pub use slack_api_client::{SlackApiClient, SlackClientConfig};
