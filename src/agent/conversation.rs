//! The live message history owned by the agent between turns.

use crate::llm::{ChatMessage, Role};

/// Ordered conversation history. Grows by appending; only the trim and
/// reset policies remove messages.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        self.messages.extend(messages);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Sliding-window policy: keep only the most recent `window` messages,
    /// in their original order. Returns how many were dropped.
    pub fn trim_to_window(&mut self, window: usize) -> usize {
        let excess = self.messages.len().saturating_sub(window);
        if excess > 0 {
            self.messages.drain(..excess);
        }
        excess
    }

    /// Full-reset policy: discard everything and start over from `message`.
    pub fn reset_to(&mut self, message: ChatMessage) {
        self.messages.clear();
        self.messages.push(message);
    }

    /// Roll back to an earlier length.
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// Messages to send to the model. The sliding window can cut an
    /// assistant message away from its tool results; those leading orphans
    /// are skipped here since the provider rejects them.
    pub fn request_view(&self) -> &[ChatMessage] {
        let start = self
            .messages
            .iter()
            .position(|m| m.role != Role::Tool)
            .unwrap_or(self.messages.len());
        &self.messages[start..]
    }
}
