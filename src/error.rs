//! Error taxonomy for the agent loop.
//!
//! Only [`AgentError`] ever reaches the user. Tool failures are rendered
//! into tool-result messages for the model, and rate limits are recovered
//! inside the loop.

use thiserror::Error;

/// Number of characters of an error shown to the user.
pub const USER_ERROR_PREVIEW_CHARS: usize = 100;

/// Failure reported by the model gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    /// The provider refused the request because of quota or request size.
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Classify a provider error by status and message text.
    pub fn from_provider(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == Some(429) || is_rate_limit_message(&message) {
            Self::RateLimited(message)
        } else {
            Self::Other(message)
        }
    }
}

/// Whether error text from the provider signals a rate limit.
pub fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate_limit_exceeded")
        || lower.contains("request too large")
        || lower.contains("rate limit")
}

/// Failure of a single tool call. Always rendered inline for the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("tool '{tool}' failed: {source}")]
    InvocationFailed {
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("tool '{tool}' timed out after {secs} seconds")]
    Timeout { tool: String, secs: u64 },
}

/// Failure that ends a turn without a final answer.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model gateway failure: {0}")]
    GatewayFailure(String),

    #[error("max iterations ({0}) reached without a final answer")]
    MaxIterationsExceeded(usize),
}

impl AgentError {
    /// Short form shown to the user; the session stays usable afterwards.
    pub fn user_message(&self) -> String {
        let full = match self {
            Self::GatewayFailure(msg) => msg.clone(),
            other => other.to_string(),
        };
        truncate_chars(&full, USER_ERROR_PREVIEW_CHARS)
    }
}

/// Truncate to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
