//! Port for structured conversation logging.
//!
//! Separate from `tracing` diagnostics: tracing carries human-readable
//! operation logs, while this port records each request/reply exchange in a
//! machine-readable transcript (JSONL in the infrastructure adapter).

use serde_json::Value;

/// A structured conversation event for logging.
pub struct ConversationEvent {
    /// Event type identifier, one of the `EVENT_*` constants.
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

/// Request sent to the chat API.
pub const EVENT_REQUEST_SENT: &str = "request_sent";
/// Stream finished (with or without the end marker).
pub const EVENT_REPLY_COMPLETED: &str = "reply_completed";
/// Stream aborted by a transport error.
pub const EVENT_REPLY_FAILED: &str = "reply_failed";
/// Caller abandoned the stream.
pub const EVENT_REPLY_CANCELLED: &str = "reply_cancelled";

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation events.
///
/// `log` is synchronous and infallible: a broken transcript must never
/// interrupt a reply.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
