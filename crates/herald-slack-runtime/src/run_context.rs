//! Per-invocation inputs for the notifier.

use std::path::PathBuf;
use std::str::FromStr;

use crate::NotifyError;

/// Behavior selected for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyMode {
    Start,
    Upload,
    Finish,
}

impl NotifyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Upload => "upload",
            Self::Finish => "finish",
        }
    }

    fn requires_thread(self) -> bool {
        matches!(self, Self::Upload | Self::Finish)
    }
}

impl FromStr for NotifyMode {
    type Err = NotifyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "upload" => Ok(Self::Upload),
            "finish" => Ok(Self::Finish),
            _ => Err(NotifyError::Config(format!(
                "unsupported action `{}`; expected one of start, upload, finish",
                value.trim()
            ))),
        }
    }
}

/// Pieces of the CI run URL, taken from the runner environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunLink {
    pub server_url: String,
    pub repository: Option<String>,
    pub run_id: Option<String>,
}

impl RunLink {
    /// `None` unless both the repository and the run id are known.
    pub fn url(&self) -> Option<String> {
        let repository = self.repository.as_deref()?.trim_matches('/');
        let run_id = self.run_id.as_deref()?;
        Some(format!(
            "{}/{}/actions/runs/{}",
            self.server_url.trim_end_matches('/'),
            repository,
            run_id
        ))
    }
}

/// Immutable inputs for one notifier invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub mode: NotifyMode,
    pub channel: String,
    pub message_text: String,
    pub author: String,
    pub status: Option<String>,
    pub thread_ts: Option<String>,
    pub screenshots_dir: PathBuf,
    pub videos_dir: PathBuf,
    pub run_link: RunLink,
}

impl RunContext {
    /// Checks preconditions that must hold before any remote call.
    ///
    /// Returns the thread timestamp for modes that extend an existing thread.
    pub fn validate(&self) -> Result<Option<&str>, NotifyError> {
        if self.channel.trim().trim_start_matches('#').is_empty() {
            return Err(NotifyError::Config("channel must not be empty".to_string()));
        }
        if !self.mode.requires_thread() {
            return Ok(None);
        }
        match self
            .thread_ts
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(thread_ts) => Ok(Some(thread_ts)),
            None => Err(NotifyError::Config(format!(
                "thread-id is required for the {} action",
                self.mode.as_str()
            ))),
        }
    }

    /// Channel name as it appears in `conversations.list`.
    pub fn channel_name(&self) -> &str {
        let trimmed = self.channel.trim();
        trimmed.strip_prefix('#').unwrap_or(trimmed)
    }

    /// True only for the exact reported status `success`.
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;

    use super::{NotifyMode, RunContext, RunLink};
    use crate::NotifyError;

    pub(crate) fn test_context(mode: NotifyMode) -> RunContext {
        RunContext {
            mode,
            channel: "#ci".to_string(),
            message_text: "Deploy".to_string(),
            author: "alice".to_string(),
            status: None,
            thread_ts: None,
            screenshots_dir: PathBuf::from("cypress/screenshots"),
            videos_dir: PathBuf::from("cypress/videos"),
            run_link: RunLink {
                server_url: "https://github.com".to_string(),
                repository: Some("acme/shop".to_string()),
                run_id: Some("42".to_string()),
            },
        }
    }

    #[test]
    fn unit_notify_mode_parses_case_insensitively() {
        assert_eq!("start".parse::<NotifyMode>(), Ok(NotifyMode::Start));
        assert_eq!("UPLOAD".parse::<NotifyMode>(), Ok(NotifyMode::Upload));
        assert_eq!(" Finish ".parse::<NotifyMode>(), Ok(NotifyMode::Finish));
    }

    #[test]
    fn regression_notify_mode_rejects_unknown_values_as_config_errors() {
        for raw in ["", "deploy", "started", "finish-now"] {
            let error = raw.parse::<NotifyMode>().expect_err("invalid mode");
            assert!(matches!(error, NotifyError::Config(_)), "{raw}: {error}");
        }
    }

    #[test]
    fn functional_run_link_builds_actions_url() {
        let link = RunLink {
            server_url: "https://github.example.com/".to_string(),
            repository: Some("acme/shop".to_string()),
            run_id: Some("987".to_string()),
        };
        assert_eq!(
            link.url().as_deref(),
            Some("https://github.example.com/acme/shop/actions/runs/987")
        );
        let missing = RunLink {
            run_id: None,
            ..link
        };
        assert_eq!(missing.url(), None);
    }

    #[test]
    fn unit_validate_requires_thread_for_upload_and_finish() {
        for mode in [NotifyMode::Upload, NotifyMode::Finish] {
            let mut context = test_context(mode);
            assert!(matches!(context.validate(), Err(NotifyError::Config(_))));
            context.thread_ts = Some("   ".to_string());
            assert!(matches!(context.validate(), Err(NotifyError::Config(_))));
            context.thread_ts = Some("169000.1".to_string());
            assert_eq!(context.validate(), Ok(Some("169000.1")));
        }
        assert_eq!(test_context(NotifyMode::Start).validate(), Ok(None));
    }

    #[test]
    fn regression_validate_rejects_blank_channel() {
        let mut context = test_context(NotifyMode::Start);
        context.channel = " # ".to_string();
        assert!(matches!(context.validate(), Err(NotifyError::Config(_))));
    }

    #[test]
    fn unit_channel_name_strips_single_leading_hash() {
        let mut context = test_context(NotifyMode::Start);
        assert_eq!(context.channel_name(), "ci");
        context.channel = "##ci".to_string();
        assert_eq!(context.channel_name(), "#ci");
        context.channel = "Release".to_string();
        assert_eq!(context.channel_name(), "Release");
    }

    #[test]
    fn unit_succeeded_matches_exact_success_only() {
        let mut context = test_context(NotifyMode::Finish);
        assert!(!context.succeeded());
        context.status = Some("success".to_string());
        assert!(context.succeeded());
        for other in ["Success", "success ", "failure", "cancelled", ""] {
            context.status = Some(other.to_string());
            assert!(!context.succeeded(), "{other:?}");
        }
    }
}
