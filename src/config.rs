//! Configuration management for the looping agent.
//!
//! Configuration can be set via environment variables:
//! - `GROQ_API_KEY` - Required. API key for the chat-completions provider.
//! - `DEFAULT_MODEL` - Optional. The LLM model to use. Defaults to `llama-3.1-8b-instant`.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible base URL. Defaults to Groq's endpoint.
//! - `HISTORY_WINDOW` - Optional. Messages kept between turns. Defaults to `10`.
//! - `MAX_ITERATIONS` - Optional. Maximum model calls per turn. Defaults to `8`.
//! - `RATE_LIMIT_BACKOFF_SECS` - Optional. Pause after a rate limit. Defaults to `5`.
//! - `LLM_TIMEOUT_SECS` - Optional. Per-request model timeout. Defaults to `60`.
//! - `TOOL_TIMEOUT_SECS` - Optional. Per-tool invocation timeout. Defaults to `30`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_HISTORY_WINDOW: usize = 10;
pub const DEFAULT_MAX_ITERATIONS: usize = 8;
pub const DEFAULT_RATE_LIMIT_BACKOFF_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider API key
    pub api_key: String,

    /// LLM model identifier
    pub default_model: String,

    /// Base URL of the OpenAI-compatible API (without `/chat/completions`)
    pub base_url: String,

    /// Number of most recent messages kept at the start of each turn
    pub history_window: usize,

    /// Maximum model calls within a single turn
    pub max_iterations: usize,

    /// Pause applied after the provider reports a rate limit
    pub rate_limit_backoff: Duration,

    /// Timeout for a single model request
    pub llm_timeout: Duration,

    /// Timeout for a single tool invocation
    pub tool_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GROQ_API_KEY` is not set, and
    /// `ConfigError::InvalidValue` if a numeric variable does not parse or a
    /// bound is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GROQ_API_KEY".to_string()))?;

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let base_url = std::env::var("LLM_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let history_window = env_parse("HISTORY_WINDOW", DEFAULT_HISTORY_WINDOW)?;
        let max_iterations = env_parse("MAX_ITERATIONS", DEFAULT_MAX_ITERATIONS)?;
        let backoff_secs = env_parse("RATE_LIMIT_BACKOFF_SECS", DEFAULT_RATE_LIMIT_BACKOFF_SECS)?;
        let llm_timeout_secs = env_parse("LLM_TIMEOUT_SECS", 60u64)?;
        let tool_timeout_secs = env_parse("TOOL_TIMEOUT_SECS", 30u64)?;

        let config = Self {
            api_key,
            default_model,
            base_url,
            history_window,
            max_iterations,
            rate_limit_backoff: Duration::from_secs(backoff_secs),
            llm_timeout: Duration::from_secs(llm_timeout_secs),
            tool_timeout: Duration::from_secs(tool_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String) -> Self {
        Self {
            api_key,
            default_model,
            base_url: DEFAULT_BASE_URL.to_string(),
            history_window: DEFAULT_HISTORY_WINDOW,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            rate_limit_backoff: Duration::from_secs(DEFAULT_RATE_LIMIT_BACKOFF_SECS),
            llm_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(30),
        }
    }

    /// Reject bounds that would make the loop unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_window == 0 {
            return Err(ConfigError::InvalidValue(
                "HISTORY_WINDOW".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))
}
