//! Executes model-requested tool calls and wraps their results.

use std::time::Duration;

use crate::error::ToolError;
use crate::llm::{ChatMessage, ToolCall};
use crate::tools::ToolRegistry;

/// Runs tool calls against a [`ToolRegistry`].
///
/// Every request yields exactly one tool-result message, in request order,
/// carrying the request's id. Failures never escape: they become the
/// result's content so the model can adapt.
pub struct ToolDispatcher {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(registry: ToolRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute `requests` sequentially, in the order given.
    pub async fn execute(&self, requests: &[ToolCall]) -> Vec<ChatMessage> {
        let mut results = Vec::with_capacity(requests.len());

        for call in requests {
            tracing::info!(
                tool = %call.function.name,
                call_id = %call.id,
                args = %call.function.arguments,
                "Calling tool"
            );

            let content = match self.execute_one(call).await {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(tool = %call.function.name, error = %e, "Tool call failed");
                    format!("Error: {}", e)
                }
            };

            results.push(ChatMessage::tool_result(call.id.clone(), content));
        }

        results
    }

    async fn execute_one(&self, call: &ToolCall) -> Result<String, ToolError> {
        let name = call.function.name.as_str();
        let tool = self.registry.resolve(name)?;

        let args = call
            .parsed_arguments()
            .map_err(|e| ToolError::InvalidArguments {
                tool: name.to_string(),
                reason: e.to_string(),
            })?;

        match tokio::time::timeout(self.timeout, tool.execute(args)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(ToolError::InvocationFailed {
                tool: name.to_string(),
                source,
            }),
            Err(_) => Err(ToolError::Timeout {
                tool: name.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}
