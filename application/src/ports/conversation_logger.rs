//! Port for structured conversation logging.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures the conversation
//! transcript (prompts, tool calls, results, model text) in a
//! machine-readable format (JSONL).

use serde_json::Value;

/// A structured conversation event for logging.
///
/// The adapter adds the `type` and `timestamp` fields when writing.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    /// Event type identifier (e.g., "session_start", "tool_call").
    pub event_type: &'static str,
    /// Id of the conversation the event belongs to.
    pub conversation_id: String,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(
        event_type: &'static str,
        conversation_id: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            event_type,
            conversation_id: conversation_id.into(),
            payload,
        }
    }
}

/// Port for logging conversation events to a structured log.
///
/// `log` is synchronous and infallible; adapters swallow write failures.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
