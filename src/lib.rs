//! # Looping Agent
//!
//! A minimal conversational agent that loops between a language model and a
//! small set of callable tools until the model produces a final answer.
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Append the user message to the conversation, trimmed to a sliding window
//! 2. Call the LLM with the conversation and the tool schemas
//! 3. Execute any requested tool calls, in order, and append their results
//! 4. Repeat until the LLM answers, bounded by a maximum iteration count
//!
//! Rate limits from the provider are recovered inside the loop (back off,
//! reset history, advise the user); other failures end the turn with a short
//! error while keeping the session usable.
//!
//! ## Example
//!
//! ```rust,ignore
//! use looping_agent::{agent::{Agent, Conversation}, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::new(config)?;
//! let mut conversation = Conversation::new();
//! let outcome = agent.run_turn(&mut conversation, "What is 6 times 7?").await?;
//! println!("{}", outcome.text());
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;

pub use config::Config;
