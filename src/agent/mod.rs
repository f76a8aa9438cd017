//! Agent module - the conversational tool-calling loop.
//!
//! Each user turn follows a "tools in a loop" pattern:
//! 1. Append the user message and trim history to the configured window
//! 2. Call the LLM with the conversation and available tools
//! 3. If the LLM requests tool calls, execute them in order and feed the results back
//! 4. Repeat until the LLM produces a final answer or max iterations is reached

mod agent_loop;
mod conversation;
mod dispatcher;
mod prompt;

pub use agent_loop::{Agent, TurnOutcome, RATE_LIMIT_ADVISORY};
pub use conversation::Conversation;
pub use dispatcher::ToolDispatcher;
pub use prompt::build_system_prompt;
