//! Per-session correlation data.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity and bookkeeping for one authoring or evaluation conversation.
///
/// Created when a session starts and dropped with it. Every structured log
/// record the session emits carries [`conversation_id`](Self::conversation_id).
#[derive(Debug, Clone)]
pub struct ConversationContext {
    conversation_id: String,
    started_at: DateTime<Utc>,
    turns: usize,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self {
            conversation_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            turns: 0,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Record one model round trip and return the new count.
    pub fn next_turn(&mut self) -> usize {
        self.turns += 1;
        self.turns
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}
