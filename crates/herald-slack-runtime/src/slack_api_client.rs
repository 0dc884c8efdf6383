//! Slack Web API client used by the notifier for posting, editing and uploads.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::chat_api::{ChatApi, MessageBody, PostedMessage, SlackChannel, UploadedFile};
use crate::slack_helpers::{
    parse_retry_after, retry_delay, should_retry_status, should_retry_transport,
    slack_error_label, truncate_for_error, Replay,
};
use crate::NotifyError;

const CONVERSATIONS_PAGE_LIMIT: &str = "200";
const CONVERSATIONS_MAX_PAGES: usize = 100;

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationsListResponse {
    ok: bool,
    #[serde(default)]
    channels: Vec<SlackChannel>,
    #[serde(default)]
    response_metadata: Option<SlackResponseMetadata>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackChatMessageResponse {
    ok: bool,
    ts: Option<String>,
    channel: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackGetUploadUrlExternalResponse {
    ok: bool,
    upload_url: Option<String>,
    file_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackCompleteUploadExternalResponse {
    ok: bool,
    error: Option<String>,
}

/// Connection settings for [`SlackApiClient`].
#[derive(Debug, Clone)]
pub struct SlackClientConfig {
    pub api_base: String,
    pub bot_token: String,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl SlackApiClient {
    pub fn new(config: SlackClientConfig) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("herald-ci-notifier"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.trim().to_string(),
            retry_max_attempts: config.retry_max_attempts.max(1),
            retry_base_delay_ms: config.retry_base_delay_ms.max(1),
        })
    }

    /// Lists every channel visible to the token, following response cursors.
    pub async fn conversations_list(&self) -> Result<Vec<SlackChannel>> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;
        for _ in 0..CONVERSATIONS_MAX_PAGES {
            let mut query = vec![
                ("types", "public_channel,private_channel".to_string()),
                ("exclude_archived", "true".to_string()),
                ("limit", CONVERSATIONS_PAGE_LIMIT.to_string()),
            ];
            if let Some(cursor) = cursor.as_ref() {
                query.push(("cursor", cursor.clone()));
            }

            let response: SlackConversationsListResponse = self
                .request_json(
                    "conversations.list",
                    || {
                        self.http
                            .get(format!("{}/conversations.list", self.api_base))
                            .bearer_auth(&self.bot_token)
                            .query(&query)
                    },
                    Replay::Safe,
                )
                .await?;
            if !response.ok {
                bail!(
                    "slack conversations.list failed: {}",
                    slack_error_label(response.error)
                );
            }
            channels.extend(response.channels);

            cursor = response
                .response_metadata
                .and_then(|metadata| metadata.next_cursor)
                .filter(|value| !value.trim().is_empty());
            if cursor.is_none() {
                return Ok(channels);
            }
        }
        tracing::warn!(
            pages = CONVERSATIONS_MAX_PAGES,
            "slack conversations.list page limit reached; channel list may be incomplete"
        );
        Ok(channels)
    }

    pub async fn chat_post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        body: &MessageBody,
    ) -> Result<PostedMessage> {
        let mut payload = message_payload(channel, body)?;
        payload["unfurl_links"] = Value::Bool(false);
        payload["unfurl_media"] = Value::Bool(false);
        if let Some(thread_ts) = thread_ts {
            payload["thread_ts"] = Value::String(thread_ts.to_string());
        }

        let response: SlackChatMessageResponse = self
            .request_json(
                "chat.postMessage",
                || {
                    self.http
                        .post(format!("{}/chat.postMessage", self.api_base))
                        .bearer_auth(&self.bot_token)
                        .json(&payload)
                },
                Replay::Undelivered,
            )
            .await?;

        if !response.ok {
            bail!(
                "slack chat.postMessage failed: {}",
                slack_error_label(response.error)
            );
        }

        Ok(PostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts: response
                .ts
                .ok_or_else(|| anyhow!("slack chat.postMessage response missing ts"))?,
        })
    }

    pub async fn chat_update(
        &self,
        channel: &str,
        ts: &str,
        body: &MessageBody,
    ) -> Result<PostedMessage> {
        let mut payload = message_payload(channel, body)?;
        payload["ts"] = Value::String(ts.to_string());
        let response: SlackChatMessageResponse = self
            .request_json(
                "chat.update",
                || {
                    self.http
                        .post(format!("{}/chat.update", self.api_base))
                        .bearer_auth(&self.bot_token)
                        .json(&payload)
                },
                Replay::Safe,
            )
            .await?;
        if !response.ok {
            bail!(
                "slack chat.update failed: {}",
                slack_error_label(response.error)
            );
        }
        Ok(PostedMessage {
            channel: response.channel.unwrap_or_else(|| channel.to_string()),
            ts: response.ts.unwrap_or_else(|| ts.to_string()),
        })
    }

    /// Uploads one file through the external upload flow and shares it into
    /// `thread_ts`.
    pub async fn upload_file_v2(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile> {
        if filename.trim().is_empty() {
            bail!("slack files upload requires non-empty filename");
        }
        let file_size = bytes.len();
        if file_size == 0 {
            bail!("slack files upload requires non-empty payload for {filename}");
        }

        let length = file_size.to_string();
        let get_upload: SlackGetUploadUrlExternalResponse = self
            .request_json(
                "files.getUploadURLExternal",
                || {
                    self.http
                        .post(format!("{}/files.getUploadURLExternal", self.api_base))
                        .bearer_auth(&self.bot_token)
                        .form(&[("filename", filename), ("length", length.as_str())])
                },
                Replay::Safe,
            )
            .await?;
        if !get_upload.ok {
            bail!(
                "slack files.getUploadURLExternal failed for {filename}: {}",
                slack_error_label(get_upload.error)
            );
        }
        let upload_url = get_upload
            .upload_url
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("slack files.getUploadURLExternal missing upload_url"))?;
        let file_id = get_upload
            .file_id
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("slack files.getUploadURLExternal missing file_id"))?;

        let upload_response = self
            .http
            .post(upload_url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("failed to upload {filename} to slack external upload URL"))?;
        if !upload_response.status().is_success() {
            let status = upload_response.status();
            let body = upload_response.text().await.unwrap_or_default();
            bail!(
                "slack external upload failed for {filename}: status={} body={}",
                status,
                truncate_for_error(&body, 320)
            );
        }

        let mut complete_payload = json!({
            "files": [{ "id": file_id.clone(), "title": filename }],
            "channel_id": channel,
        });
        if let Some(thread_ts) = thread_ts.map(str::trim).filter(|value| !value.is_empty()) {
            complete_payload["thread_ts"] = Value::String(thread_ts.to_string());
        }

        let complete: SlackCompleteUploadExternalResponse = self
            .request_json(
                "files.completeUploadExternal",
                || {
                    self.http
                        .post(format!("{}/files.completeUploadExternal", self.api_base))
                        .bearer_auth(&self.bot_token)
                        .json(&complete_payload)
                },
                Replay::Undelivered,
            )
            .await?;
        if !complete.ok {
            bail!(
                "slack files.completeUploadExternal failed for {filename}: {}",
                slack_error_label(complete.error)
            );
        }

        Ok(UploadedFile { file_id })
    }

    async fn request_json<T, F>(
        &self,
        operation: &str,
        mut builder: F,
        replay: Replay,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = builder()
                .header(
                    "x-herald-retry-attempt",
                    attempt.saturating_sub(1).to_string(),
                )
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed = response
                            .json::<T>()
                            .await
                            .with_context(|| format!("failed to decode slack {operation}"))?;
                        return Ok(parsed);
                    }

                    let retry_after = parse_retry_after(response.headers());
                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.retry_max_attempts
                        && should_retry_status(status.as_u16(), replay)
                    {
                        tracing::debug!(
                            operation,
                            attempt,
                            status = status.as_u16(),
                            "retrying slack api request"
                        );
                        tokio::time::sleep(retry_delay(
                            self.retry_base_delay_ms,
                            attempt,
                            retry_after,
                        ))
                        .await;
                        continue;
                    }

                    bail!(
                        "slack api {operation} failed with status {}: {}",
                        status.as_u16(),
                        truncate_for_error(&body, 800)
                    );
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts && should_retry_transport(&error, replay) {
                        tracing::debug!(operation, attempt, %error, "retrying slack api request");
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(error)
                        .with_context(|| format!("slack api {operation} request failed"));
                }
            }
        }
    }
}

fn message_payload(channel: &str, body: &MessageBody) -> Result<Value> {
    let mut payload =
        serde_json::to_value(body).context("failed to encode slack message payload")?;
    payload["channel"] = Value::String(channel.to_string());
    payload["link_names"] = Value::Bool(true);
    Ok(payload)
}

#[async_trait]
impl ChatApi for SlackApiClient {
    async fn list_channels(&self) -> Result<Vec<SlackChannel>, NotifyError> {
        self.conversations_list().await.map_err(NotifyError::remote)
    }

    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        body: &MessageBody,
    ) -> Result<PostedMessage, NotifyError> {
        self.chat_post_message(channel, thread_ts, body)
            .await
            .map_err(NotifyError::remote)
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        body: &MessageBody,
    ) -> Result<PostedMessage, NotifyError> {
        self.chat_update(channel, ts, body)
            .await
            .map_err(NotifyError::remote)
    }

    async fn upload_file(
        &self,
        channel: &str,
        thread_ts: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, NotifyError> {
        self.upload_file_v2(channel, Some(thread_ts), filename, bytes)
            .await
            .map_err(NotifyError::remote)
    }
}
