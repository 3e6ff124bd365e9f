//! Chat transport port
//!
//! Opens the remote streaming chat call. A successful call yields the raw
//! response body as a stream of byte chunks; the SSE framing inside it is
//! decoded by the [`StreamIngestor`](crate::streaming::StreamIngestor), not
//! by the transport.

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use std::pin::Pin;
use talkback_domain::ChatPayload;
use thiserror::Error;

/// Error code the chat API uses when the account has run out of tokens.
pub const INSUFFICIENT_BALANCE_CODE: i64 = 4011;

/// Raw response body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Errors that can occur while opening or reading the reply stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Insufficient token balance, please top up and try again (error code: {code})")]
    InsufficientBalance { code: i64 },

    #[error("Request failed: {status} {status_text}{}", detail_suffix(.message))]
    RequestFailed {
        status: u16,
        status_text: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),
}

fn detail_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(". {}", message)
    }
}

impl TransportError {
    /// Classify a non-success HTTP response.
    ///
    /// The body is parsed as JSON when possible: a `code` of
    /// [`INSUFFICIENT_BALANCE_CODE`] is reported as a balance error, anything
    /// else as a generic failure carrying `message` (or `msg`) from the body.
    pub fn from_error_response(status: u16, status_text: &str, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();

        let code = parsed
            .as_ref()
            .and_then(|v| v.get("code"))
            .and_then(Value::as_i64);
        if code == Some(INSUFFICIENT_BALANCE_CODE) {
            return TransportError::InsufficientBalance {
                code: INSUFFICIENT_BALANCE_CODE,
            };
        }

        let message = parsed
            .as_ref()
            .and_then(|v| v.get("message").or_else(|| v.get("msg")))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        TransportError::RequestFailed {
            status,
            status_text: status_text.to_string(),
            message,
        }
    }

    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, TransportError::InsufficientBalance { .. })
    }
}

/// A fully described streaming chat call
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub endpoint: String,
    pub api_key: String,
    pub payload: ChatPayload,
}

/// Transport for the remote chat API
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the request and return the response body as a byte stream.
    ///
    /// Non-success responses must be reported as
    /// [`TransportError::InsufficientBalance`] or
    /// [`TransportError::RequestFailed`]; connection failures as
    /// [`TransportError::Network`].
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError>;
}
