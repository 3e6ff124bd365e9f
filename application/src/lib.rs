//! Application layer for talkback
//!
//! This crate contains the session store, reply stream ingestion, the send
//! message use case and the port definitions adapters implement.
//! It depends only on the domain layer.

pub mod ports;
pub mod store;
pub mod streaming;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use ports::{
    chat_storage::{ChatStorage, StorageError, StorageSlot},
    chat_transport::{
        ByteStream, ChatRequest, ChatTransport, INSUFFICIENT_BALANCE_CODE, TransportError,
    },
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    progress::{NoReplyProgress, ReplyProgressNotifier},
};
pub use store::{SessionError, SessionState, SessionStore};
pub use streaming::{IngestOutcome, IngestReport, ReplySink, StreamIngestor};
pub use use_cases::send_message::{
    DEFAULT_USER_ID, SendMessageError, SendMessageInput, SendMessageOutput, SendMessageUseCase,
};
