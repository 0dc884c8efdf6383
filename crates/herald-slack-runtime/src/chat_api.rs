//! Remote chat surface consumed by the notifier.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::NotifyError;

/// Channel entry as returned by `conversations.list`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlackChannel {
    pub id: String,
    pub name: String,
}

/// Colored attachment wrapping Block Kit blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageAttachment {
    pub color: String,
    pub blocks: Vec<Value>,
}

/// Message payload shared by post and update calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageBody {
    /// Plain fallback text, also used for notifications.
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<MessageAttachment>,
}

impl MessageBody {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_id: String,
}

#[async_trait]
/// Trait contract for the chat platform operations the notifier needs.
///
/// Implementations own transport concerns (auth, retries, rate limits) and
/// report every failure as [`NotifyError::Remote`].
pub trait ChatApi: Send + Sync {
    async fn list_channels(&self) -> Result<Vec<SlackChannel>, NotifyError>;

    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        body: &MessageBody,
    ) -> Result<PostedMessage, NotifyError>;

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        body: &MessageBody,
    ) -> Result<PostedMessage, NotifyError>;

    async fn upload_file(
        &self,
        channel: &str,
        thread_ts: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, NotifyError>;
}
