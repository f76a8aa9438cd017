//! Client for OpenAI-compatible chat-completions endpoints (Groq by default).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, LlmClient, ModelResponse, ToolCall, ToolSchema};
use crate::config::Config;
use crate::error::LlmError;

/// Chat-completions client over HTTP.
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    /// Build a client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.llm_timeout)
            .build()
            .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ModelResponse, LlmError> {
        let tools = tools.filter(|t| !t.is_empty());
        let request = ChatCompletionRequest {
            model,
            messages,
            tools,
            tool_choice: tools.map(|_| "auto"),
        };

        tracing::debug!(
            model = %model,
            messages = messages.len(),
            tools = tools.map(|t| t.len()).unwrap_or(0),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Other(format!("Request timed out: {}", e))
                } else {
                    LlmError::Other(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Other(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        parse_completion(&body)
    }
}

/// Map a non-success HTTP response to a gateway error.
fn classify_error(status: u16, body: &str) -> LlmError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.code {
            Some(code) => format!("Error code: {} - {} ({})", status, envelope.error.message, code),
            None => format!("Error code: {} - {}", status, envelope.error.message),
        },
        Err(_) => format!("Error code: {} - {}", status, body.trim()),
    };
    LlmError::from_provider(Some(status), message)
}

/// Convert a successful response body into a [`ModelResponse`].
fn parse_completion(body: &str) -> Result<ModelResponse, LlmError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::Other(format!("Malformed completion response: {}", e)))?;

    let message = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| LlmError::Other("Completion response contained no choices".to_string()))?;

    match message.tool_calls {
        Some(calls) if !calls.is_empty() => Ok(ModelResponse::ToolCallsRequested {
            content: message.content.filter(|c| !c.is_empty()),
            calls,
        }),
        _ => match message.content {
            Some(text) => Ok(ModelResponse::FinalAnswer { text }),
            None => Err(LlmError::Other("LLM returned empty response".to_string())),
        },
    }
}
