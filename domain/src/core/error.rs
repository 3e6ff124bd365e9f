//! Domain error types

use crate::chat::value_objects::MessageId;
use thiserror::Error;

/// Domain-level errors
///
/// These describe rule violations on a single [`Chat`](crate::Chat). The
/// session store treats all of them as "nothing to do" rather than failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Chat title must not be empty")]
    EmptyTitle,

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("Message {0} is not an assistant message")]
    NotAssistantMessage(MessageId),
}

impl DomainError {
    /// Check if this error means the target message does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::MessageNotFound(_))
    }
}
