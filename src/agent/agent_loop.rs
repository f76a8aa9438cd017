//! Core agent loop implementation.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{AgentError, LlmError};
use crate::llm::{ChatMessage, GroqClient, LlmClient, ModelResponse};
use crate::tools::ToolRegistry;

use super::conversation::Conversation;
use super::dispatcher::ToolDispatcher;
use super::prompt::build_system_prompt;

/// Shown instead of an error when the provider rate-limits a turn.
pub const RATE_LIMIT_ADVISORY: &str =
    "API rate limit reached. Please wait a moment before trying again.";

/// How a turn ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model produced a final answer.
    Answer(String),
    /// The provider rate-limited the turn; history was reset.
    RateLimited { advisory: String },
}

impl TurnOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) => text,
            Self::RateLimited { advisory } => advisory,
        }
    }
}

/// The conversational agent: alternates model calls and tool execution
/// until the model answers.
pub struct Agent {
    config: Config,
    llm: Arc<dyn LlmClient>,
    dispatcher: ToolDispatcher,
    system_prompt: String,
}

impl Agent {
    /// Create an agent talking to the configured provider with the built-in tools.
    pub fn new(config: Config) -> Result<Self, LlmError> {
        let llm = Arc::new(GroqClient::new(&config)?);
        Ok(Self::with_parts(config, llm, ToolRegistry::new()))
    }

    /// Create an agent from explicit collaborators.
    pub fn with_parts(config: Config, llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        let system_prompt = build_system_prompt(&tools);
        let dispatcher = ToolDispatcher::new(tools, config.tool_timeout);
        Self {
            config,
            llm,
            dispatcher,
            system_prompt,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one user turn to completion.
    ///
    /// On `Err`, everything the failed turn added after the user message is
    /// discarded, so the conversation stays usable for the next turn.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        user_input: &str,
    ) -> Result<TurnOutcome, AgentError> {
        conversation.push(ChatMessage::user(user_input));

        let dropped = conversation.trim_to_window(self.config.history_window);
        if dropped > 0 {
            tracing::debug!(dropped, "Trimmed conversation to window");
        }
        let turn_start = conversation.len();

        let tool_schemas = self.dispatcher.registry().describe_all();
        let max_iterations = self.config.max_iterations;

        for iteration in 0..max_iterations {
            tracing::debug!("Agent iteration {}", iteration + 1);

            let request = self.build_request(conversation);
            let response = match self
                .llm
                .chat_completion(
                    &self.config.default_model,
                    &request,
                    Some(tool_schemas.as_slice()),
                )
                .await
            {
                Ok(response) => response,
                Err(LlmError::RateLimited(message)) => {
                    tracing::warn!(
                        backoff_secs = self.config.rate_limit_backoff.as_secs(),
                        error = %message,
                        "Rate limited by model provider, resetting history"
                    );
                    tokio::time::sleep(self.config.rate_limit_backoff).await;
                    conversation.reset_to(ChatMessage::user(user_input));
                    return Ok(TurnOutcome::RateLimited {
                        advisory: RATE_LIMIT_ADVISORY.to_string(),
                    });
                }
                Err(LlmError::Other(message)) => {
                    tracing::error!(error = %message, "Model gateway call failed");
                    conversation.truncate(turn_start);
                    return Err(AgentError::GatewayFailure(message));
                }
            };

            match response {
                ModelResponse::ToolCallsRequested { content, calls } if !calls.is_empty() => {
                    conversation.push(ChatMessage::assistant_tool_calls(content, calls.clone()));
                    let results = self.dispatcher.execute(&calls).await;
                    conversation.extend(results);
                }
                ModelResponse::ToolCallsRequested { content, .. } => {
                    return Ok(self.finish(conversation, content.unwrap_or_default()));
                }
                ModelResponse::FinalAnswer { text } => {
                    return Ok(self.finish(conversation, text));
                }
            }
        }

        tracing::warn!(max_iterations, "Turn hit the iteration cap");
        conversation.truncate(turn_start);
        Err(AgentError::MaxIterationsExceeded(max_iterations))
    }

    fn finish(&self, conversation: &mut Conversation, text: String) -> TurnOutcome {
        conversation.push(ChatMessage::assistant(text.clone()));
        TurnOutcome::Answer(text)
    }

    fn build_request(&self, conversation: &Conversation) -> Vec<ChatMessage> {
        let history = conversation.request_view();
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend_from_slice(history);
        messages
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::llm::{Role, ToolCall, ToolSchema};
    use crate::tools::{Multiply, Tool};

    // ── Scripted gateway ──

    struct ScriptedLlm {
        responses: Mutex<VecDeque<Result<ModelResponse, LlmError>>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<Result<ModelResponse, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(VecDeque::from(responses)),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn request(&self, i: usize) -> Vec<ChatMessage> {
            self.requests.lock().unwrap()[i].clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn chat_completion(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _tools: Option<&[ToolSchema]>,
        ) -> Result<ModelResponse, LlmError> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Other("no more scripted responses".to_string())))
        }
    }

    /// Always asks for another multiplication.
    struct LoopingLlm;

    #[async_trait]
    impl LlmClient for LoopingLlm {
        async fn chat_completion(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _tools: Option<&[ToolSchema]>,
        ) -> Result<ModelResponse, LlmError> {
            Ok(calls(vec![ToolCall::new(
                format!("call_{}", messages.len()),
                "multiply",
                json!({"a": 2, "b": 2}),
            )]))
        }
    }

    struct CountingTool(AtomicUsize);

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "count"
        }

        fn description(&self) -> &str {
            "Counts invocations"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: Value) -> anyhow::Result<String> {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(n.to_string())
        }
    }

    fn answer(text: &str) -> ModelResponse {
        ModelResponse::FinalAnswer {
            text: text.to_string(),
        }
    }

    fn calls(calls: Vec<ToolCall>) -> ModelResponse {
        ModelResponse::ToolCallsRequested {
            content: None,
            calls,
        }
    }

    fn test_config() -> Config {
        let mut config = Config::new("test-key".to_string(), "test-model".to_string());
        config.max_iterations = 8;
        config.history_window = 10;
        config
    }

    fn agent(llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Agent {
        Agent::with_parts(test_config(), llm, tools)
    }

    #[tokio::test]
    async fn direct_answer_is_appended() {
        let llm = ScriptedLlm::new(vec![Ok(answer("Hello!"))]);
        let agent = agent(llm.clone(), ToolRegistry::new());
        let mut conversation = Conversation::new();

        let outcome = agent.run_turn(&mut conversation, "hi").await.unwrap();

        assert_eq!(outcome, TurnOutcome::Answer("Hello!".to_string()));
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].role, Role::User);
        assert_eq!(conversation.messages()[1].content.as_deref(), Some("Hello!"));
        assert_eq!(llm.calls(), 1);

        // System prompt is sent but never stored.
        let sent = llm.request(0);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[1].content.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn one_tool_round_then_answer() {
        let counter = Arc::new(CountingTool(AtomicUsize::new(0)));
        let llm = ScriptedLlm::new(vec![
            Ok(calls(vec![ToolCall::new("call_1", "count", json!({}))])),
            Ok(answer("counted once")),
        ]);
        let tools = ToolRegistry::with_tools(vec![counter.clone() as Arc<dyn Tool>]);
        let agent = agent(llm.clone(), tools);
        let mut conversation = Conversation::new();

        let outcome = agent.run_turn(&mut conversation, "count please").await.unwrap();

        assert_eq!(outcome.text(), "counted once");
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(llm.calls(), 2);

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );

        // The second model call sees the tool result for the issued call id.
        let second = llm.request(1);
        let tool_msg = second.iter().find(|m| m.role == Role::Tool).unwrap();
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_msg.content.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn unknown_tool_does_not_abort_the_turn() {
        let llm = ScriptedLlm::new(vec![
            Ok(calls(vec![ToolCall::new("c1", "frobnicate", json!({}))])),
            Ok(answer("sorry, no such tool")),
        ]);
        let agent = agent(llm.clone(), ToolRegistry::new());
        let mut conversation = Conversation::new();

        let outcome = agent.run_turn(&mut conversation, "frob it").await.unwrap();

        assert_eq!(outcome.text(), "sorry, no such tool");
        let tool_msg = &conversation.messages()[2];
        assert!(tool_msg.content.as_deref().unwrap().contains("unknown tool"));
    }

    #[tokio::test]
    async fn endless_tool_requests_hit_the_cap() {
        let agent = agent(Arc::new(LoopingLlm), ToolRegistry::with_tools(vec![Arc::new(Multiply)]));
        let mut conversation = Conversation::new();
        conversation.push(ChatMessage::user("earlier"));
        conversation.push(ChatMessage::assistant("reply"));

        let err = agent.run_turn(&mut conversation, "loop forever").await.unwrap_err();

        assert!(matches!(err, AgentError::MaxIterationsExceeded(8)));
        // Intermediate messages are discarded; the user message stays.
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.last().unwrap().content.as_deref(), Some("loop forever"));
    }

    #[tokio::test]
    async fn iteration_cap_counts_model_calls() {
        let responses = (0..3)
            .map(|i| {
                let call = ToolCall::new(format!("c{}", i), "multiply", json!({"a": 1, "b": 1}));
                Ok(calls(vec![call]))
            })
            .collect();
        let llm = ScriptedLlm::new(responses);
        let mut config = test_config();
        config.max_iterations = 3;
        let agent = Agent::with_parts(config, llm.clone(), ToolRegistry::new());

        let err = agent
            .run_turn(&mut Conversation::new(), "go")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MaxIterationsExceeded(3)));
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_backs_off_and_resets_history() {
        let llm = ScriptedLlm::new(vec![Err(LlmError::RateLimited(
            "rate_limit_exceeded".to_string(),
        ))]);
        let agent = agent(llm.clone(), ToolRegistry::new());
        let mut conversation = Conversation::new();
        for i in 0..6 {
            conversation.push(ChatMessage::user(format!("old {}", i)));
        }

        let started = tokio::time::Instant::now();
        let outcome = agent.run_turn(&mut conversation, "latest").await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(5));
        assert_eq!(
            outcome,
            TurnOutcome::RateLimited {
                advisory: RATE_LIMIT_ADVISORY.to_string()
            }
        );
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].content.as_deref(), Some("latest"));
    }

    #[tokio::test]
    async fn gateway_failure_rolls_back_the_turn() {
        let llm = ScriptedLlm::new(vec![
            Ok(calls(vec![ToolCall::new("c1", "multiply", json!({"a": 6, "b": 7}))])),
            Err(LlmError::Other("Error code: 500 - upstream exploded".to_string())),
        ]);
        let agent = agent(llm, ToolRegistry::new());
        let mut conversation = Conversation::new();

        let err = agent.run_turn(&mut conversation, "what is 6*7").await.unwrap_err();

        assert_eq!(err.user_message(), "Error code: 500 - upstream exploded");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::User);
    }

    #[tokio::test]
    async fn history_is_trimmed_before_the_model_call() {
        let llm = ScriptedLlm::new(vec![Ok(answer("ok"))]);
        let agent = agent(llm.clone(), ToolRegistry::new());
        let mut conversation = Conversation::new();
        for i in 0..15 {
            conversation.push(ChatMessage::user(format!("m{}", i)));
        }

        agent.run_turn(&mut conversation, "newest").await.unwrap();

        // Window of 10 including the new user message, plus the system prompt.
        let sent = llm.request(0);
        assert_eq!(sent.len(), 11);
        assert_eq!(sent[1].content.as_deref(), Some("m6"));
        assert_eq!(sent[10].content.as_deref(), Some("newest"));
        assert_eq!(conversation.len(), 11);
    }

    #[tokio::test]
    async fn empty_tool_call_list_counts_as_answer() {
        let llm = ScriptedLlm::new(vec![Ok(ModelResponse::ToolCallsRequested {
            content: Some("nothing to call".to_string()),
            calls: vec![],
        })]);
        let agent = agent(llm, ToolRegistry::new());

        let outcome = agent.run_turn(&mut Conversation::new(), "hi").await.unwrap();
        assert_eq!(outcome.text(), "nothing to call");
    }
}
