//! Domain layer for talkback
//!
//! This crate contains the chat entities, the settings value object and the
//! wire-level framing of streamed assistant replies. It has no dependencies
//! on storage, transport or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Chat
//!
//! A persisted conversation: an ordered, append-only sequence of
//! [`Message`]s plus a title and the system prompt it was created with.
//!
//! ## Reply stream
//!
//! Assistant replies arrive as server-sent events. [`SseDecoder`] turns raw
//! bytes into events and [`decode_payload`] classifies each `data:` payload
//! as an answer fragment, the end marker, something to ignore, or garbage.

pub mod chat;
pub mod config;
pub mod core;
pub mod stream;

// Re-export commonly used types
pub use chat::{
    api::{ApiMessage, ApiRole, ChatPayload, ContentType},
    entities::{Chat, Message, Role, Turn, default_chat_title},
    settings::{DEFAULT_SYSTEM_PROMPT, Settings, SettingsPatch},
    value_objects::{ChatId, MessageId, Timestamp, now_millis},
};
pub use config::{ConfigIssue, ConfigIssueCode, Severity, StreamPersistence};
pub use core::error::DomainError;
pub use stream::{
    frame::{SseFrame, decode_payload},
    sse::{SseDecoder, SseEvent},
};
