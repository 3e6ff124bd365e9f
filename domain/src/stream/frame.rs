//! Classification of individual `data:` payloads.
//!
//! A reply stream carries JSON payloads of the shape
//! `{ "message": { "role": ..., "type": ..., "content": ... } }` and ends with
//! the literal `[DONE]`. Only assistant answers are visible text; every other
//! well-formed payload is ignored so the server can add event kinds freely.

use serde_json::Value;

/// Payload that marks the normal end of a reply stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// `message.type` of payloads that carry visible reply text.
pub const ANSWER_TYPE: &str = "answer";

/// What a single `data:` payload means for the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// A fragment of the assistant's answer, to be appended.
    Answer(String),
    /// Normal end of stream.
    Done,
    /// Well-formed, but not part of the visible answer.
    Ignored,
    /// Not valid JSON.
    Malformed { error: String },
}

impl SseFrame {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SseFrame::Done)
    }
}

/// Decode one `data:` payload.
pub fn decode_payload(data: &str) -> SseFrame {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return SseFrame::Done;
    }

    let value: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            return SseFrame::Malformed {
                error: e.to_string(),
            };
        }
    };

    let Some(message) = value.get("message") else {
        return SseFrame::Ignored;
    };

    let role = message.get("role").and_then(Value::as_str);
    let kind = message.get("type").and_then(Value::as_str);
    let content = message.get("content").and_then(Value::as_str);

    match (role, kind, content) {
        (Some("assistant"), Some(ANSWER_TYPE), Some(content)) => {
            SseFrame::Answer(content.to_string())
        }
        _ => SseFrame::Ignored,
    }
}
