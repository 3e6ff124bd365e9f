//! Test doubles shared by the application layer's unit tests.

use crate::ports::chat_storage::{ChatStorage, StorageError, StorageSlot};
use crate::ports::chat_transport::{ByteStream, ChatRequest, ChatTransport, TransportError};
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::streaming::ReplySink;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Mutex;
use talkback_domain::MessageId;

/// Storage that keeps slots in memory and counts writes.
#[derive(Default)]
pub struct RecordingStorage {
    slots: Mutex<HashMap<StorageSlot, String>>,
    writes: Mutex<usize>,
    fail_writes: bool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn with_slot(self, slot: StorageSlot, contents: &str) -> Self {
        self.slots.lock().unwrap().insert(slot, contents.to_string());
        self
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    pub fn slot(&self, slot: StorageSlot) -> Option<String> {
        self.slots.lock().unwrap().get(&slot).cloned()
    }
}

impl ChatStorage for RecordingStorage {
    fn read(&self, slot: StorageSlot) -> Result<Option<String>, StorageError> {
        Ok(self.slots.lock().unwrap().get(&slot).cloned())
    }

    fn write(&self, slot: StorageSlot, contents: &str) -> Result<(), StorageError> {
        *self.writes.lock().unwrap() += 1;
        if self.fail_writes {
            return Err(StorageError::Unavailable("disk full".to_string()));
        }
        self.slots.lock().unwrap().insert(slot, contents.to_string());
        Ok(())
    }
}

/// Sink that records every update it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub updates: Vec<(MessageId, String)>,
}

impl RecordingSink {
    pub fn contents(&self) -> Vec<&str> {
        self.updates.iter().map(|(_, c)| c.as_str()).collect()
    }
}

impl ReplySink for RecordingSink {
    fn apply(&mut self, target: &MessageId, content: &str) -> bool {
        self.updates.push((target.clone(), content.to_string()));
        true
    }
}

/// Transport that replays scripted chunks, or fails to open.
pub struct ScriptedTransport {
    outcome: Result<Vec<Vec<u8>>, TransportError>,
    stall: bool,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn chunks(chunks: &[&str]) -> Self {
        Self {
            outcome: Ok(chunks.iter().map(|c| c.as_bytes().to_vec()).collect()),
            stall: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replays `chunks`, then never yields again.
    pub fn stalling(chunks: &[&str]) -> Self {
        Self {
            stall: true,
            ..Self::chunks(chunks)
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            outcome: Err(error),
            stall: false,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let chunks = self.outcome.clone()?;
        if self.stall {
            return Ok(Box::pin(bytes(chunks).chain(futures::stream::pending())));
        }
        Ok(bytes(chunks))
    }
}

/// Turn chunks into a byte stream.
pub fn bytes(chunks: Vec<Vec<u8>>) -> ByteStream {
    Box::pin(futures::stream::iter(chunks.into_iter().map(Ok)))
}

/// Build a well-formed answer event.
pub fn answer_event(content: &str) -> String {
    let payload = serde_json::json!({
        "message": {
            "role": "assistant",
            "type": "answer",
            "content": content,
        }
    });
    format!("data: {}\n\n", payload)
}

/// Logger that keeps event types.
#[derive(Default)]
pub struct RecordingLogger {
    pub events: Mutex<Vec<ConversationEvent>>,
}

impl RecordingLogger {
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type)
            .collect()
    }
}

impl ConversationLogger for RecordingLogger {
    fn log(&self, event: ConversationEvent) {
        self.events.lock().unwrap().push(event);
    }
}
