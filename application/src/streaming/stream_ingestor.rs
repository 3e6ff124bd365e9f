//! Reply stream ingestion.
//!
//! [`StreamIngestor`] reads the raw body of a streaming chat call, decodes
//! the server-sent events inside it and hands the cumulative reply text to a
//! [`ReplySink`] after every answer fragment. It holds no state between
//! requests: build one per reply.

use crate::ports::chat_transport::{ByteStream, TransportError};
use crate::ports::progress::ReplyProgressNotifier;
use futures::StreamExt;
use talkback_domain::{MessageId, SseDecoder, SseEvent, SseFrame, decode_payload};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Receiver of cumulative reply content
///
/// The session store implements this so the ingestor never needs to know
/// about chats or persistence.
pub trait ReplySink: Send {
    /// Replace the content of `target` with `content`. Returns whether the
    /// update was applied.
    fn apply(&mut self, target: &MessageId, content: &str) -> bool;
}

/// How ingestion ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The `[DONE]` marker was received
    Done,
    /// The byte stream ended without the marker
    EndOfStream,
    /// The caller cancelled
    Cancelled,
}

/// Summary of a finished ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub outcome: IngestOutcome,
    /// Full reply text accumulated from answer fragments
    pub content: String,
    /// Number of answer fragments applied
    pub fragments: usize,
    /// Number of payloads that were not valid JSON
    pub malformed: usize,
}

impl IngestReport {
    pub fn new(outcome: IngestOutcome) -> Self {
        Self {
            outcome,
            content: String::new(),
            fragments: 0,
            malformed: 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome == IngestOutcome::Cancelled
    }
}

enum Step {
    Continue,
    Done,
}

/// Feeds one reply stream into a sink
pub struct StreamIngestor {
    target: MessageId,
    cancellation_token: Option<CancellationToken>,
}

impl StreamIngestor {
    /// Create an ingestor that writes into the message `target`.
    pub fn new(target: MessageId) -> Self {
        Self {
            target,
            cancellation_token: None,
        }
    }

    /// Set a cancellation token to abandon the stream early.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn target(&self) -> &MessageId {
        &self.target
    }

    /// Read `stream` to completion, the end marker, an error or cancellation.
    ///
    /// Content applied before a transport error stays applied; the error is
    /// returned as-is. `progress` only hears about fragments the sink accepted.
    pub async fn run(
        &self,
        mut stream: ByteStream,
        sink: &mut dyn ReplySink,
        progress: &dyn ReplyProgressNotifier,
    ) -> Result<IngestReport, TransportError> {
        let mut decoder = SseDecoder::new();
        let mut report = IngestReport::new(IngestOutcome::EndOfStream);

        loop {
            let next = if let Some(ref token) = self.cancellation_token {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Reply stream cancelled after {} fragments", report.fragments);
                        report.outcome = IngestOutcome::Cancelled;
                        return Ok(report);
                    }
                    chunk = stream.next() => chunk,
                }
            } else {
                stream.next().await
            };

            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk?;
            trace!("Received {} bytes", chunk.len());

            for event in decoder.push(&chunk) {
                if let Step::Done = self.handle_event(event, &mut report, sink, progress) {
                    report.outcome = IngestOutcome::Done;
                    return Ok(report);
                }
            }
        }

        if let Some(event) = decoder.finish()
            && let Step::Done = self.handle_event(event, &mut report, sink, progress)
        {
            report.outcome = IngestOutcome::Done;
            return Ok(report);
        }

        warn!(
            "Reply stream ended without end marker ({} fragments received)",
            report.fragments
        );
        Ok(report)
    }

    fn handle_event(
        &self,
        event: SseEvent,
        report: &mut IngestReport,
        sink: &mut dyn ReplySink,
        progress: &dyn ReplyProgressNotifier,
    ) -> Step {
        for data in &event.data {
            match decode_payload(data) {
                SseFrame::Done => return Step::Done,
                SseFrame::Answer(fragment) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    report.content.push_str(&fragment);
                    report.fragments += 1;
                    if sink.apply(&self.target, &report.content) {
                        progress.on_fragment(&fragment, &report.content);
                    } else {
                        debug!("Sink rejected update for {}", self.target);
                    }
                }
                SseFrame::Ignored => {
                    trace!("Ignoring non-answer payload");
                }
                SseFrame::Malformed { error } => {
                    report.malformed += 1;
                    debug!("Skipping malformed payload: {}", error);
                }
            }
        }
        Step::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoReplyProgress;
    use crate::test_support::{RecordingSink, answer_event, bytes};
    use futures::stream;
    use std::sync::Mutex;

    fn chunks(parts: &[&str]) -> ByteStream {
        bytes(parts.iter().map(|p| p.as_bytes().to_vec()).collect())
    }

    async fn ingest(stream: ByteStream) -> (Result<IngestReport, TransportError>, RecordingSink) {
        let mut sink = RecordingSink::default();
        let result = StreamIngestor::new(MessageId::from("m1"))
            .run(stream, &mut sink, &NoReplyProgress)
            .await;
        (result, sink)
    }

    #[tokio::test]
    async fn test_cumulative_updates() {
        let first = answer_event("Hi");
        let second = answer_event(" there");
        let (result, sink) = ingest(chunks(&[first.as_str(), second.as_str(), "data: [DONE]\n\n"])).await;

        let report = result.unwrap();
        assert_eq!(report.outcome, IngestOutcome::Done);
        assert_eq!(report.content, "Hi there");
        assert_eq!(report.fragments, 2);
        assert_eq!(sink.contents(), vec!["Hi", "Hi there"]);
        assert!(sink.updates.iter().all(|(id, _)| id.as_str() == "m1"));
    }

    #[tokio::test]
    async fn test_literal_wire_sequence() {
        let body = concat!(
            "data: {\"message\":{\"role\":\"assistant\",\"type\":\"answer\",\"content\":\"Hi\"}}\n\n",
            "data: {\"message\":{\"role\":\"assistant\",\"type\":\"answer\",\"content\":\" there\"}}\n\n",
            "data: [DONE]\n\n",
        );
        let (result, sink) = ingest(chunks(&[body])).await;

        assert_eq!(result.unwrap().content, "Hi there");
        assert_eq!(sink.contents(), vec!["Hi", "Hi there"]);
    }

    #[tokio::test]
    async fn test_arbitrary_chunk_boundaries() {
        let body = format!(
            "{}{}data: [DONE]\n\n",
            answer_event("héllo"),
            answer_event(" wörld")
        );
        // Split every 3 bytes, cutting through UTF-8 sequences and terminators
        let parts: Vec<Vec<u8>> = body.as_bytes().chunks(3).map(<[u8]>::to_vec).collect();
        let (result, sink) = ingest(bytes(parts)).await;

        assert_eq!(result.unwrap().outcome, IngestOutcome::Done);
        assert_eq!(sink.contents(), vec!["héllo", "héllo wörld"]);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_skipped() {
        let first = answer_event("A");
        let second = answer_event("B");
        let (result, sink) = ingest(chunks(&[
            first.as_str(),
            "data: {not json\n\n",
            second.as_str(),
            "data: [DONE]\n\n",
        ]))
        .await;

        let report = result.unwrap();
        assert_eq!(report.malformed, 1);
        assert_eq!(sink.contents(), vec!["A", "AB"]);
    }

    #[tokio::test]
    async fn test_non_answer_payloads_are_ignored() {
        let answer = answer_event("ok");
        let (result, sink) = ingest(chunks(&[
            "data: {\"message\":{\"role\":\"assistant\",\"type\":\"verbose\",\"content\":\"x\"}}\n\n",
            "data: {\"message\":{\"role\":\"user\",\"type\":\"answer\",\"content\":\"y\"}}\n\n",
            "data: {\"event\":\"conversation.chat.created\"}\n\n",
            ": keep-alive\n\n",
            "event: ping\n\n",
            answer.as_str(),
            "data: [DONE]\n\n",
        ]))
        .await;

        let report = result.unwrap();
        assert_eq!(report.malformed, 0);
        assert_eq!(sink.contents(), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_nothing_read_after_done() {
        let before = answer_event("kept");
        let after = answer_event("dropped");
        let (result, sink) = ingest(chunks(&[format!("{}data: [DONE]\n\n{}", before, after).as_str()])).await;

        assert_eq!(result.unwrap().content, "kept");
        assert_eq!(sink.contents(), vec!["kept"]);
    }

    #[tokio::test]
    async fn test_end_without_marker_completes() {
        let only = answer_event("partial");
        let (result, sink) = ingest(chunks(&[only.as_str()])).await;

        let report = result.unwrap();
        assert_eq!(report.outcome, IngestOutcome::EndOfStream);
        assert_eq!(report.content, "partial");
        assert_eq!(sink.contents(), vec!["partial"]);
    }

    #[tokio::test]
    async fn test_unterminated_trailing_event_is_delivered() {
        let body = "data: {\"message\":{\"role\":\"assistant\",\"type\":\"answer\",\"content\":\"tail\"}}";
        let (result, sink) = ingest(chunks(&[body])).await;

        assert_eq!(result.unwrap().content, "tail");
        assert_eq!(sink.contents(), vec!["tail"]);
    }

    #[tokio::test]
    async fn test_crlf_line_endings() {
        let body = "data: {\"message\":{\"role\":\"assistant\",\"type\":\"answer\",\"content\":\"crlf\"}}\r\n\r\ndata: [DONE]\r\n\r\n";
        let (result, sink) = ingest(chunks(&[body])).await;

        assert_eq!(result.unwrap().outcome, IngestOutcome::Done);
        assert_eq!(sink.contents(), vec!["crlf"]);
    }

    #[tokio::test]
    async fn test_empty_fragments_do_not_update() {
        let empty = answer_event("");
        let full = answer_event("x");
        let (result, sink) = ingest(chunks(&[empty.as_str(), full.as_str(), "data: [DONE]\n\n"])).await;

        assert_eq!(result.unwrap().fragments, 1);
        assert_eq!(sink.contents(), vec!["x"]);
    }

    #[tokio::test]
    async fn test_transport_error_keeps_partial_content() {
        let first = answer_event("half");
        let items: Vec<Result<Vec<u8>, TransportError>> = vec![
            Ok(first.into_bytes()),
            Err(TransportError::Network("connection reset".to_string())),
        ];
        let (result, sink) = ingest(Box::pin(stream::iter(items))).await;

        assert_eq!(
            result,
            Err(TransportError::Network("connection reset".to_string()))
        );
        assert_eq!(sink.contents(), vec!["half"]);
    }

    #[tokio::test]
    async fn test_cancellation_before_first_chunk() {
        let token = CancellationToken::new();
        token.cancel();
        let first = answer_event("never");

        let mut sink = RecordingSink::default();
        let report = StreamIngestor::new(MessageId::from("m1"))
            .with_cancellation(token)
            .run(chunks(&[first.as_str()]), &mut sink, &NoReplyProgress)
            .await
            .unwrap();

        assert!(report.is_cancelled());
        assert!(sink.updates.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_mid_stream() {
        let token = CancellationToken::new();
        let (tx, rx) = futures::channel::mpsc::unbounded::<Result<Vec<u8>, TransportError>>();
        tx.unbounded_send(Ok(answer_event("one").into_bytes()))
            .unwrap();

        let ingestor = StreamIngestor::new(MessageId::from("m1")).with_cancellation(token.clone());
        let mut sink = RecordingSink::default();
        let canceller = async {
            tokio::task::yield_now().await;
            token.cancel();
        };
        let (report, _) = tokio::join!(
            ingestor.run(Box::pin(rx), &mut sink, &NoReplyProgress),
            canceller
        );

        let report = report.unwrap();
        assert!(report.is_cancelled());
        assert_eq!(report.content, "one");
        assert_eq!(sink.contents(), vec!["one"]);
        drop(tx);
    }

    struct FragmentLog(Mutex<Vec<(String, String)>>);

    impl ReplyProgressNotifier for FragmentLog {
        fn on_fragment(&self, fragment: &str, content: &str) {
            self.0
                .lock()
                .unwrap()
                .push((fragment.to_string(), content.to_string()));
        }
    }

    #[tokio::test]
    async fn test_progress_receives_fragments() {
        let progress = FragmentLog(Mutex::new(Vec::new()));
        let a = answer_event("a");
        let b = answer_event("b");
        let mut sink = RecordingSink::default();
        StreamIngestor::new(MessageId::from("m1"))
            .run(chunks(&[a.as_str(), b.as_str()]), &mut sink, &progress)
            .await
            .unwrap();

        let seen = progress.0.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), "a".to_string()),
                ("b".to_string(), "ab".to_string())
            ]
        );
    }

    struct RejectingSink;

    impl ReplySink for RejectingSink {
        fn apply(&mut self, _target: &MessageId, _content: &str) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_progress_skips_rejected_updates() {
        let progress = FragmentLog(Mutex::new(Vec::new()));
        let a = answer_event("a");
        let report = StreamIngestor::new(MessageId::from("gone"))
            .run(chunks(&[a.as_str(), "data: [DONE]\n\n"]), &mut RejectingSink, &progress)
            .await
            .unwrap();

        assert_eq!(report.outcome, IngestOutcome::Done);
        assert!(progress.0.lock().unwrap().is_empty());
    }
}
