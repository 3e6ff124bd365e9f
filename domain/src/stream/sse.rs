//! Incremental server-sent events decoder.
//!
//! Bytes arrive in arbitrary chunks: a chunk may end in the middle of a line,
//! in the middle of a multi-byte UTF-8 character, or between the two newlines
//! that terminate an event. [`SseDecoder`] buffers raw bytes and only decodes
//! complete lines, so none of those splits matter.
//!
//! Recognized fields are `data:` and `event:`. Comments (`:` prefix) and any
//! other field are dropped. A blank line terminates the current event.

/// One decoded server-sent event.
///
/// Every `data:` line is kept as its own payload, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: Vec<String>,
}

impl SseEvent {
    fn is_empty(&self) -> bool {
        self.event.is_none() && self.data.is_empty()
    }
}

/// Longest line the decoder will buffer. Anything longer is dropped up to
/// its newline.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Line-buffering SSE decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Bytes at the front of `buffer` already known to hold no newline
    scanned: usize,
    /// Inside an overlong line that is being skipped
    discarding: bool,
    dropped_lines: usize,
    pending: SseEvent,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return every event it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();

        let chunk = if self.discarding {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    self.discarding = false;
                    &chunk[pos + 1..]
                }
                None => return events,
            }
        } else {
            chunk
        };
        self.buffer.extend_from_slice(chunk);

        while let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            let raw: Vec<u8> = self.buffer.drain(..=end).collect();
            self.scanned = 0;
            if let Some(event) = self.process_line(&raw) {
                events.push(event);
            }
        }
        self.scanned = self.buffer.len();

        if self.buffer.len() > MAX_LINE_BYTES {
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
            self.dropped_lines += 1;
        }
        events
    }

    /// Flush at end of stream.
    ///
    /// A trailing line without newline and an event missing its blank-line
    /// terminator are both delivered rather than dropped.
    pub fn finish(&mut self) -> Option<SseEvent> {
        self.scanned = 0;
        self.discarding = false;
        if !self.buffer.is_empty() {
            let raw = std::mem::take(&mut self.buffer);
            if let Some(event) = self.process_line(&raw) {
                return Some(event);
            }
        }
        self.take_pending()
    }

    /// Bytes received but not yet decoded into a line.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Lines dropped for exceeding [`MAX_LINE_BYTES`].
    pub fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }

    fn process_line(&mut self, raw: &[u8]) -> Option<SseEvent> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\n', '\r']);

        if line.is_empty() {
            return self.take_pending();
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.pending.data.push(value.to_string()),
            "event" => self.pending.event = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn take_pending(&mut self) -> Option<SseEvent> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}
