use thiserror::Error;

/// Failure taxonomy for a single notifier invocation.
///
/// Every variant is fatal. `Config` is raised before any remote call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("channel resolution failed: {0}")]
    ChannelResolution(String),
    #[error("{0}")]
    Remote(String),
    #[error("artifact discovery failed: {0}")]
    Artifacts(String),
}

impl NotifyError {
    pub(crate) fn remote(error: anyhow::Error) -> Self {
        Self::Remote(format!("{error:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::NotifyError;

    #[test]
    fn unit_remote_error_keeps_context_chain() {
        let error = anyhow::anyhow!("channel_not_found").context("slack chat.update failed");
        assert_eq!(
            NotifyError::remote(error).to_string(),
            "slack chat.update failed: channel_not_found"
        );
    }

    #[test]
    fn unit_config_error_is_prefixed() {
        let error = NotifyError::Config("unsupported action `deploy`".to_string());
        assert_eq!(
            error.to_string(),
            "configuration error: unsupported action `deploy`"
        );
    }
}
