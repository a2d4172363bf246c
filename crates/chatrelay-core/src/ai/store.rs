//! In-memory conversation store
//!
//! The API-key client has no server-side conversation state, so each thread is
//! rebuilt from messages kept here and linked through `parent_message_id`.
//! Nothing is persisted; the store lives as long as the client.

use std::collections::HashSet;

use moka::sync::Cache;
use tracing::debug;

use super::types::ChatMessage;

/// Rough token estimate: ~0.3 tokens per ASCII char, 1.5 per non-ASCII char
pub fn estimate_tokens(text: &str) -> usize {
    let tenths: usize = text
        .chars()
        .map(|c| if c.is_ascii() { 3 } else { 15 })
        .sum();
    tenths.div_ceil(10)
}

/// Bounded message cache keyed by message id
pub struct MessageStore {
    messages: Cache<String, ChatMessage>,
}

impl MessageStore {
    pub fn new(capacity: u64) -> Self {
        Self {
            messages: Cache::new(capacity),
        }
    }

    pub fn get(&self, id: &str) -> Option<ChatMessage> {
        self.messages.get(id)
    }

    pub fn upsert(&self, message: ChatMessage) {
        self.messages.insert(message.id.clone(), message);
    }

    /// Walk back from `parent_message_id`, returning the thread oldest first
    ///
    /// Stops once adding the next older message would exceed `budget_tokens`,
    /// when a link is missing, or on a cycle.
    pub fn thread(&self, parent_message_id: Option<&str>, budget_tokens: usize) -> Vec<ChatMessage> {
        let mut thread = Vec::new();
        let mut seen = HashSet::new();
        let mut used = 0usize;
        let mut next = parent_message_id.map(str::to_string);

        while let Some(id) = next.take() {
            if !seen.insert(id.clone()) {
                break;
            }
            let Some(message) = self.get(&id) else {
                debug!("Thread walk stopped at unknown message {}", id);
                break;
            };
            let cost = estimate_tokens(&message.text);
            if used + cost > budget_tokens {
                break;
            }
            used += cost;
            next = message.parent_message_id.clone();
            thread.push(message);
        }

        thread.reverse();
        debug!("Rebuilt thread: {} messages, ~{} tokens", thread.len(), used);
        thread
    }
}
