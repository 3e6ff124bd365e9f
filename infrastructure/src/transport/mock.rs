//! Offline transport that replays a canned reply.
//!
//! Produces exactly the framing the real API uses: one
//! `data: {"message":{...}}` event per fragment with the fragment JSON
//! escaped, then `data: [DONE]`.

use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use talkback_application::ports::chat_transport::{
    ByteStream, ChatRequest, ChatTransport, TransportError,
};
use tracing::debug;

const DEFAULT_FRAGMENTS: &[&str] = &[
    "Hello! I'm the talkback demo assistant. Let me show you what I can do.\n\n",
    "I can help you write code, like this small JavaScript function:\n\n",
    "```javascript\n",
    "function greetUser(name) {\n",
    "  return `Hello, ${name}! Welcome to talkback.`;\n",
    "}\n\n",
    "console.log(greetUser(\"friend\"));\n",
    "```\n\n",
    "I can also:\n",
    "- **Answer questions** about technical and everyday topics\n",
    "- **Write code** in many languages\n",
    "- **Explain concepts** step by step\n",
    "- **Suggest solutions** you can act on\n\n",
    "This is a mock reply for testing without an API account. ",
    "Turn off mock mode to talk to the real service.",
];

/// Transport that never touches the network
#[derive(Debug, Clone)]
pub struct MockStreamTransport {
    fragments: Vec<String>,
    delay: Duration,
}

impl Default for MockStreamTransport {
    fn default() -> Self {
        Self {
            fragments: DEFAULT_FRAGMENTS.iter().map(|f| f.to_string()).collect(),
            delay: Duration::from_millis(100),
        }
    }
}

impl MockStreamTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the canned reply.
    pub fn with_fragments<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments = fragments.into_iter().map(Into::into).collect();
        self
    }

    /// Pause between fragments.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn frames(&self) -> Vec<String> {
        self.fragments
            .iter()
            .map(|fragment| answer_frame(fragment))
            .chain(std::iter::once("data: [DONE]\n\n".to_string()))
            .collect()
    }
}

/// One SSE event carrying `fragment` as an assistant answer.
fn answer_frame(fragment: &str) -> String {
    let payload = serde_json::json!({
        "message": {
            "role": "assistant",
            "type": "answer",
            "content": fragment,
        }
    });
    format!("data: {}\n\n", payload)
}

#[async_trait]
impl ChatTransport for MockStreamTransport {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        debug!(
            "Mock transport answering {} messages",
            request.payload.additional_messages.len()
        );

        let delay = self.delay;
        let stream = futures::stream::iter(self.frames()).then(move |frame| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, TransportError>(frame.into_bytes())
        });
        Ok(Box::pin(stream))
    }
}
