use std::time::Duration;

/// Upper bound honored from a `Retry-After` header.
pub(crate) const MAX_RETRY_AFTER_SECONDS: u64 = 60;
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Whether a request may be replayed after Slack could have acted on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Replay {
    /// Reads and in-place edits; a duplicate leaves the same end state.
    Safe,
    /// Creates a message or shares a file; only resent when undelivered.
    Undelivered,
}

pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|seconds| seconds.min(MAX_RETRY_AFTER_SECONDS))
}

pub(crate) fn retry_delay(
    base_delay_ms: u64,
    attempt: usize,
    retry_after_seconds: Option<u64>,
) -> Duration {
    match retry_after_seconds {
        Some(seconds) => Duration::from_secs(seconds.min(MAX_RETRY_AFTER_SECONDS)),
        None => {
            let exponent = u32::try_from(attempt.saturating_sub(1))
                .unwrap_or(MAX_BACKOFF_EXPONENT)
                .min(MAX_BACKOFF_EXPONENT);
            Duration::from_millis(base_delay_ms.max(1).saturating_mul(1_u64 << exponent))
        }
    }
}

/// 429 means Slack refused the request, so it is always safe to resend.
/// A 5xx may arrive after the write landed.
pub(crate) fn should_retry_status(status: u16, replay: Replay) -> bool {
    match status {
        429 => true,
        500..=599 => replay == Replay::Safe,
        _ => false,
    }
}

/// Connection failures never reached Slack. Timeouts and broken bodies might
/// have, so only replay-safe requests are resent after them.
pub(crate) fn should_retry_transport(error: &reqwest::Error, replay: Replay) -> bool {
    if error.is_connect() {
        return true;
    }
    replay == Replay::Safe && (error.is_timeout() || error.is_request() || error.is_body())
}

pub(crate) fn truncate_for_slack(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect::<String>();
    truncated.push_str("...");
    truncated
}

pub(crate) fn truncate_for_error(value: &str, max_chars: usize) -> String {
    truncate_for_slack(value, max_chars)
}

/// Slack error field, falling back when the API omitted it.
pub(crate) fn slack_error_label(error: Option<String>) -> String {
    error
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "unknown error".to_string())
}
