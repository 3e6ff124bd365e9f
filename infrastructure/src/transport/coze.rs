//! HTTP transport for the Coze streaming chat API.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use talkback_application::ports::chat_transport::{
    ByteStream, ChatRequest, ChatTransport, TransportError,
};
use tracing::{debug, warn};

/// Streams replies from the chat API over HTTP
#[derive(Debug, Clone)]
pub struct CozeHttpTransport {
    client: reqwest::Client,
}

impl CozeHttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(None)
    }

    /// Build a client with an overall request timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChatTransport for CozeHttpTransport {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        if request.endpoint.trim().is_empty() {
            return Err(TransportError::Network(
                "no API endpoint configured".to_string(),
            ));
        }

        debug!(
            "POST {} ({} messages)",
            request.endpoint,
            request.payload.additional_messages.len()
        );

        let response = self
            .client
            .post(&request.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", request.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .json(&request.payload)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = TransportError::from_error_response(
                status.as_u16(),
                status.canonical_reason().unwrap_or(""),
                &body,
            );
            warn!("Chat API returned {}: {}", status, error);
            return Err(error);
        }

        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| TransportError::Network(e.to_string()))
        });
        Ok(Box::pin(stream))
    }
}
