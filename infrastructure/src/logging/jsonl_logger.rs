//! JSONL transcript of request/reply exchanges.
//!
//! Each [`ConversationEvent`] becomes one JSON line carrying the event
//! payload plus `type`, `timestamp` and a per-process `seq` number. The file
//! is opened in append mode so transcripts from several runs accumulate.

use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use talkback_application::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use tracing::warn;

/// Conversation logger that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every event and
/// on `Drop`.
pub struct JsonlConversationLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    seq: AtomicU64,
}

impl JsonlConversationLogger {
    /// Open (or create) the transcript at `path`.
    ///
    /// Parent directories are created as needed. Returns `None` when the
    /// file cannot be opened; the caller then runs without a transcript.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create conversation log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not open conversation log {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
            seq: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(&self, event: ConversationEvent) -> Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        let mut map = match event.payload {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        map.insert("type".to_string(), Value::from(event.event_type));
        map.insert("timestamp".to_string(), Value::from(timestamp));
        map.insert("seq".to_string(), Value::from(seq));
        Value::Object(map)
    }
}

impl ConversationLogger for JsonlConversationLogger {
    fn log(&self, event: ConversationEvent) {
        let record = self.record(event);
        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlConversationLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkback_application::ports::conversation_logger::{
        EVENT_REPLY_COMPLETED, EVENT_REQUEST_SENT,
    };

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("talkback.jsonl");
        let logger = JsonlConversationLogger::open(&path).unwrap();

        logger.log(ConversationEvent::new(
            EVENT_REQUEST_SENT,
            serde_json::json!({ "chat_id": "c1", "messages": 3 }),
        ));
        logger.log(ConversationEvent::new(
            EVENT_REPLY_COMPLETED,
            serde_json::json!({ "chat_id": "c1", "fragments": 2 }),
        ));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "request_sent");
        assert_eq!(lines[0]["messages"], 3);
        assert_eq!(lines[0]["seq"], 0);
        assert_eq!(lines[1]["type"], "reply_completed");
        assert_eq!(lines[1]["seq"], 1);
        assert!(lines.iter().all(|l| l.get("timestamp").is_some()));
    }

    #[test]
    fn test_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talkback.jsonl");

        for _ in 0..2 {
            let logger = JsonlConversationLogger::open(&path).unwrap();
            logger.log(ConversationEvent::new(EVENT_REQUEST_SENT, Value::Null));
        }

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[test]
    fn test_non_object_payload_goes_under_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talkback.jsonl");
        let logger = JsonlConversationLogger::open(&path).unwrap();

        logger.log(ConversationEvent::new(
            EVENT_REQUEST_SENT,
            serde_json::json!("just a string"),
        ));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["type"], "request_sent");
        assert_eq!(lines[0]["data"], "just a string");
    }

    #[test]
    fn test_open_fails_when_parent_is_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().join("nested.jsonl");

        assert!(JsonlConversationLogger::open(path).is_none());
    }
}
