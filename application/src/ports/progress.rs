//! Reply progress port.
//!
//! [`ReplyProgressNotifier`] is an **output port** the presentation layer
//! implements to show a reply while it streams in. All methods default to
//! no-ops so implementers override only what they display.

/// Callbacks during a streamed reply
pub trait ReplyProgressNotifier: Send + Sync {
    /// Called once the placeholder exists and the request is about to be sent
    fn on_stream_start(&self) {}

    /// Called for each answer fragment, with the accumulated reply so far
    fn on_fragment(&self, _fragment: &str, _content: &str) {}

    /// Called when the stream ends, whatever the reason
    fn on_stream_end(&self) {}
}

/// No-op notifier for tests and non-interactive runs
pub struct NoReplyProgress;

impl ReplyProgressNotifier for NoReplyProgress {}
