//! Send Message use case.
//!
//! Drives one request/reply exchange against the active chat:
//!
//! 1. Append the user message
//! 2. Build the API payload from the chat's message sequence
//! 3. Create the assistant placeholder and raise the sending flag
//! 4. Open the transport and ingest the reply stream into the placeholder
//! 5. Clear the sending flag, whatever happened (including the future
//!    being dropped before it completes)
//!
//! Transport failures are returned to the caller after step 5, so the chat
//! always ends with a valid (possibly empty or partial) assistant message.

use crate::ports::chat_transport::{ChatRequest, ChatTransport, TransportError};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, EVENT_REPLY_CANCELLED, EVENT_REPLY_COMPLETED,
    EVENT_REPLY_FAILED, EVENT_REQUEST_SENT, NoConversationLogger,
};
use crate::ports::progress::ReplyProgressNotifier;
use crate::store::{SessionError, SessionStore};
use crate::streaming::{IngestOutcome, IngestReport, StreamIngestor};
use std::sync::Arc;
use talkback_domain::core::string::preview;
use talkback_domain::{ApiMessage, ChatId, ChatPayload, Message, MessageId};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// User id sent when none is configured.
pub const DEFAULT_USER_ID: &str = "talkback-user";

/// Errors that can occur while sending a message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("A reply is already being received")]
    AlreadySending,

    #[error("No active chat, create or select one first")]
    NoActiveChat,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<SessionError> for SendMessageError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::AlreadySending => SendMessageError::AlreadySending,
            SessionError::NoActiveChat => SendMessageError::NoActiveChat,
        }
    }
}

impl SendMessageError {
    pub fn is_insufficient_balance(&self) -> bool {
        matches!(self, SendMessageError::Transport(e) if e.is_insufficient_balance())
    }
}

/// Input for the [`SendMessageUseCase`]
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub content: String,
    pub image_url: Option<String>,
    pub cancellation_token: Option<CancellationToken>,
}

impl SendMessageInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            image_url: None,
            cancellation_token: None,
        }
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Set a cancellation token to abandon the reply early.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }
}

/// Result of a finished exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageOutput {
    pub chat_id: ChatId,
    pub user_message_id: MessageId,
    pub reply_id: MessageId,
    pub report: IngestReport,
}

impl SendMessageOutput {
    pub fn reply(&self) -> &str {
        &self.report.content
    }

    pub fn was_cancelled(&self) -> bool {
        self.report.is_cancelled()
    }
}

/// Ends the reply when dropped, so an exchange abandoned mid-await never
/// leaves the store stuck in the sending state.
struct ReplyGuard<'a> {
    store: &'a mut SessionStore,
}

impl Drop for ReplyGuard<'_> {
    fn drop(&mut self) {
        self.store.finish_reply();
    }
}

/// Use case for sending a message and streaming the reply
pub struct SendMessageUseCase {
    transport: Arc<dyn ChatTransport>,
    conversation_logger: Arc<dyn ConversationLogger>,
    user_id: String,
}

impl Clone for SendMessageUseCase {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            conversation_logger: self.conversation_logger.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

impl SendMessageUseCase {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            conversation_logger: Arc::new(NoConversationLogger),
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Set the user id sent with every request.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Send `input` in the active chat and stream the reply into it.
    pub async fn execute(
        &self,
        store: &mut SessionStore,
        input: SendMessageInput,
        progress: &dyn ReplyProgressNotifier,
    ) -> Result<SendMessageOutput, SendMessageError> {
        if input.content.trim().is_empty() {
            return Err(SendMessageError::EmptyMessage);
        }
        if store.is_sending() {
            return Err(SendMessageError::AlreadySending);
        }
        let chat_id = store
            .active_chat()
            .map(|c| c.id().clone())
            .ok_or(SendMessageError::NoActiveChat)?;

        info!("Sending message: {}", preview(&input.content, 80));

        let mut message = Message::user(input.content);
        if let Some(url) = input.image_url {
            message = message.with_image_url(url);
        }
        let user_message = store
            .push_message(message)
            .ok_or(SendMessageError::NoActiveChat)?;

        let request = self.build_request(store);
        let reply_id = store.begin_reply()?;
        let mut reply = ReplyGuard { store };

        self.conversation_logger.log(ConversationEvent::new(
            EVENT_REQUEST_SENT,
            serde_json::json!({
                "chat_id": chat_id.as_str(),
                "message_id": user_message.id().as_str(),
                "messages": request.payload.additional_messages.len(),
                "bytes": user_message.content().len(),
            }),
        ));

        progress.on_stream_start();
        let result = self
            .stream_reply(
                &request,
                &reply_id,
                &mut *reply.store,
                progress,
                input.cancellation_token.as_ref(),
            )
            .await;
        progress.on_stream_end();
        drop(reply);

        match result {
            Ok(report) => {
                let event_type = match report.outcome {
                    IngestOutcome::Cancelled => EVENT_REPLY_CANCELLED,
                    IngestOutcome::Done | IngestOutcome::EndOfStream => EVENT_REPLY_COMPLETED,
                };
                self.conversation_logger.log(ConversationEvent::new(
                    event_type,
                    serde_json::json!({
                        "chat_id": chat_id.as_str(),
                        "reply_id": reply_id.as_str(),
                        "fragments": report.fragments,
                        "malformed": report.malformed,
                        "bytes": report.content.len(),
                        "end_marker": report.outcome == IngestOutcome::Done,
                    }),
                ));
                debug!(
                    "Reply {} finished ({:?}, {} fragments)",
                    reply_id, report.outcome, report.fragments
                );

                Ok(SendMessageOutput {
                    chat_id,
                    user_message_id: user_message.id().clone(),
                    reply_id,
                    report,
                })
            }
            Err(e) => {
                warn!("Reply {} failed: {}", reply_id, e);
                self.conversation_logger.log(ConversationEvent::new(
                    EVENT_REPLY_FAILED,
                    serde_json::json!({
                        "chat_id": chat_id.as_str(),
                        "reply_id": reply_id.as_str(),
                        "error": e.to_string(),
                        "insufficient_balance": e.is_insufficient_balance(),
                    }),
                ));
                Err(e.into())
            }
        }
    }

    fn build_request(&self, store: &SessionStore) -> ChatRequest {
        let settings = store.settings();
        let messages = ApiMessage::from_turns(&store.api_message_sequence());

        ChatRequest {
            endpoint: settings.api_endpoint.clone(),
            api_key: settings.api_key.clone(),
            payload: ChatPayload::streaming(settings.bot_id.clone(), self.user_id.clone(), messages),
        }
    }

    async fn stream_reply(
        &self,
        request: &ChatRequest,
        reply_id: &MessageId,
        store: &mut SessionStore,
        progress: &dyn ReplyProgressNotifier,
        cancellation_token: Option<&CancellationToken>,
    ) -> Result<IngestReport, TransportError> {
        let stream = if let Some(token) = cancellation_token {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Request cancelled before the stream opened");
                    return Ok(IngestReport::new(IngestOutcome::Cancelled));
                }
                stream = self.transport.open_stream(request) => stream?,
            }
        } else {
            self.transport.open_stream(request).await?
        };

        let mut ingestor = StreamIngestor::new(reply_id.clone());
        if let Some(token) = cancellation_token {
            ingestor = ingestor.with_cancellation(token.clone());
        }
        ingestor.run(stream, store, progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoReplyProgress;
    use crate::ports::chat_storage::StorageSlot;
    use crate::test_support::{RecordingLogger, RecordingStorage, ScriptedTransport, answer_event};
    use std::time::Duration;
    use talkback_domain::{ApiRole, Role, Settings};

    fn active_store() -> SessionStore {
        let storage = Arc::new(RecordingStorage::new());
        let settings = Settings {
            api_endpoint: "https://api.example.com/v3/chat".to_string(),
            api_key: "sk-test".to_string(),
            bot_id: "bot-1".to_string(),
            ..Settings::default()
        };
        let mut store = SessionStore::new(storage).with_default_settings(settings);
        store.initialize();
        let id = store.create_chat();
        store.set_active_chat(id);
        store
    }

    fn hi_there() -> Vec<String> {
        vec![
            answer_event("Hi"),
            answer_event(" there"),
            "data: [DONE]\n\n".to_string(),
        ]
    }

    fn transport(chunks: &[String]) -> Arc<ScriptedTransport> {
        let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        Arc::new(ScriptedTransport::chunks(&refs))
    }

    #[tokio::test]
    async fn test_successful_exchange() {
        let mut store = active_store();
        let transport = transport(&hi_there());
        let logger = Arc::new(RecordingLogger::default());
        let use_case = SendMessageUseCase::new(transport.clone())
            .with_conversation_logger(logger.clone())
            .with_user_id("user-7");

        let output = use_case
            .execute(&mut store, SendMessageInput::new("Hello"), &NoReplyProgress)
            .await
            .unwrap();

        assert_eq!(output.reply(), "Hi there");
        assert!(!store.is_sending());

        let chat = store.active_chat().unwrap();
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].role(), Role::User);
        assert_eq!(chat.messages()[0].content(), "Hello");
        assert_eq!(chat.messages()[1].id(), &output.reply_id);
        assert_eq!(chat.messages()[1].content(), "Hi there");

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.endpoint, "https://api.example.com/v3/chat");
        assert_eq!(request.api_key, "sk-test");
        assert_eq!(request.payload.bot_id, "bot-1");
        assert_eq!(request.payload.user_id, "user-7");
        assert!(request.payload.stream);
        // System prompt and the empty placeholder are not sent
        assert_eq!(
            request.payload.additional_messages,
            vec![ApiMessage::text(ApiRole::User, "Hello")]
        );

        assert_eq!(
            logger.event_types(),
            vec![EVENT_REQUEST_SENT, EVENT_REPLY_COMPLETED]
        );
    }

    #[tokio::test]
    async fn test_history_is_sent() {
        let mut store = active_store();
        store.add_user_message("Q1");
        store.add_assistant_message("A1");
        let transport = transport(&hi_there());
        let use_case = SendMessageUseCase::new(transport.clone());

        use_case
            .execute(&mut store, SendMessageInput::new("Q2"), &NoReplyProgress)
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        let roles: Vec<ApiRole> = requests[0]
            .payload
            .additional_messages
            .iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec![ApiRole::User, ApiRole::Assistant, ApiRole::User]);
    }

    #[tokio::test]
    async fn test_insufficient_balance() {
        let mut store = active_store();
        let transport = Arc::new(ScriptedTransport::failing(
            TransportError::from_error_response(400, "Bad Request", r#"{"code":4011}"#),
        ));
        let logger = Arc::new(RecordingLogger::default());
        let use_case =
            SendMessageUseCase::new(transport).with_conversation_logger(logger.clone());

        let err = use_case
            .execute(&mut store, SendMessageInput::new("Hello"), &NoReplyProgress)
            .await
            .unwrap_err();

        assert!(err.is_insufficient_balance());
        assert!(!store.is_sending());
        // User message and an empty placeholder remain
        let chat = store.active_chat().unwrap();
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[1].role(), Role::Assistant);
        assert_eq!(chat.messages()[1].content(), "");
        assert_eq!(
            logger.event_types(),
            vec![EVENT_REQUEST_SENT, EVENT_REPLY_FAILED]
        );
    }

    #[tokio::test]
    async fn test_generic_request_failure() {
        let mut store = active_store();
        let transport = Arc::new(ScriptedTransport::failing(
            TransportError::from_error_response(
                401,
                "Unauthorized",
                r#"{"code":4100,"msg":"bad token"}"#,
            ),
        ));
        let use_case = SendMessageUseCase::new(transport);

        let err = use_case
            .execute(&mut store, SendMessageInput::new("Hello"), &NoReplyProgress)
            .await
            .unwrap_err();

        assert!(!err.is_insufficient_balance());
        assert_eq!(err.to_string(), "Request failed: 401 Unauthorized. bad token");
        assert!(!store.is_sending());
    }

    #[tokio::test]
    async fn test_failed_reply_is_excluded_from_next_request() {
        let mut store = active_store();
        let failing = SendMessageUseCase::new(Arc::new(ScriptedTransport::failing(
            TransportError::Network("down".to_string()),
        )));
        let _ = failing
            .execute(&mut store, SendMessageInput::new("first"), &NoReplyProgress)
            .await;

        let transport = transport(&hi_there());
        SendMessageUseCase::new(transport.clone())
            .execute(&mut store, SendMessageInput::new("second"), &NoReplyProgress)
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        let contents: Vec<&str> = requests[0]
            .payload
            .additional_messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_rejects_blank_message() {
        let mut store = active_store();
        let use_case = SendMessageUseCase::new(transport(&hi_there()));

        let err = use_case
            .execute(&mut store, SendMessageInput::new("   "), &NoReplyProgress)
            .await
            .unwrap_err();

        assert_eq!(err, SendMessageError::EmptyMessage);
        assert!(store.active_chat().unwrap().messages().is_empty());
    }

    #[tokio::test]
    async fn test_requires_active_chat() {
        let storage = Arc::new(RecordingStorage::new());
        let mut store = SessionStore::new(storage);
        store.initialize();
        let use_case = SendMessageUseCase::new(transport(&hi_there()));

        let err = use_case
            .execute(&mut store, SendMessageInput::new("Hello"), &NoReplyProgress)
            .await
            .unwrap_err();

        assert_eq!(err, SendMessageError::NoActiveChat);
    }

    #[tokio::test]
    async fn test_rejects_while_sending() {
        let mut store = active_store();
        store.begin_reply().unwrap();
        let transport = transport(&hi_there());
        let use_case = SendMessageUseCase::new(transport.clone());

        let err = use_case
            .execute(&mut store, SendMessageInput::new("Hello"), &NoReplyProgress)
            .await
            .unwrap_err();

        assert_eq!(err, SendMessageError::AlreadySending);
        assert!(transport.requests.lock().unwrap().is_empty());
        // Only the placeholder from begin_reply
        assert_eq!(store.active_chat().unwrap().messages().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_open() {
        let mut store = active_store();
        let token = CancellationToken::new();
        token.cancel();
        let logger = Arc::new(RecordingLogger::default());
        let use_case = SendMessageUseCase::new(transport(&hi_there()))
            .with_conversation_logger(logger.clone());

        let output = use_case
            .execute(
                &mut store,
                SendMessageInput::new("Hello").with_cancellation(token),
                &NoReplyProgress,
            )
            .await
            .unwrap();

        assert!(output.was_cancelled());
        assert_eq!(output.reply(), "");
        assert!(!store.is_sending());
        assert_eq!(
            logger.event_types(),
            vec![EVENT_REQUEST_SENT, EVENT_REPLY_CANCELLED]
        );
    }

    #[tokio::test]
    async fn test_image_url_is_kept() {
        let mut store = active_store();
        let use_case = SendMessageUseCase::new(transport(&hi_there()));

        use_case
            .execute(
                &mut store,
                SendMessageInput::new("What is this?").with_image_url("https://img.example/1.png"),
                &NoReplyProgress,
            )
            .await
            .unwrap();

        let first = &store.active_chat().unwrap().messages()[0];
        assert_eq!(first.image_url(), Some("https://img.example/1.png"));
    }

    #[tokio::test]
    async fn test_dropped_exchange_clears_sending_flag() {
        let storage = Arc::new(RecordingStorage::new());
        let mut store = SessionStore::new(storage.clone());
        store.initialize();
        let id = store.create_chat();
        store.set_active_chat(id);

        let partial = answer_event("Partial");
        let stalled = SendMessageUseCase::new(Arc::new(ScriptedTransport::stalling(&[
            partial.as_str(),
        ])));
        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            stalled.execute(&mut store, SendMessageInput::new("Hello"), &NoReplyProgress),
        )
        .await;

        assert!(abandoned.is_err());
        assert!(!store.is_sending());
        assert_eq!(store.active_chat().unwrap().messages()[1].content(), "Partial");
        // Deferred content was written when the reply ended
        assert!(storage.slot(StorageSlot::ChatList).unwrap().contains("Partial"));

        let output = SendMessageUseCase::new(transport(&hi_there()))
            .execute(&mut store, SendMessageInput::new("Again"), &NoReplyProgress)
            .await
            .unwrap();
        assert_eq!(output.reply(), "Hi there");
    }
}
