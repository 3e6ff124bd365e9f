//! Chat domain entities

use super::value_objects::{ChatId, MessageId, Timestamp, now_millis};
use crate::core::error::DomainError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in a chat (Entity)
///
/// `id` and `role` are fixed at construction. `content` can only be changed
/// through [`Chat::update_assistant_content`], which enforces the role guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: MessageId,
    role: Role,
    content: String,
    timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl Message {
    /// Create a message with a fresh id stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            content: content.into(),
            timestamp: now_millis(),
            image_url: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

/// A role/content pair as submitted to the remote chat API.
///
/// Produced by the session store's derived message sequence; unlike
/// [`Message`] it carries no identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&Message> for Turn {
    fn from(message: &Message) -> Self {
        Self::new(message.role(), message.content())
    }
}

/// Title given to a freshly created chat, e.g. `New chat 14:05`.
///
/// The clock time keeps consecutive chats apart in the list; it is not a
/// uniqueness guarantee.
pub fn default_chat_title(now: DateTime<Local>) -> String {
    format!("New chat {}", now.format("%H:%M"))
}

/// A persisted conversation (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    id: ChatId,
    title: String,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    system_prompt: String,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Chat {
    pub fn new(title: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: ChatId::generate(),
            title: title.into(),
            messages: Vec::new(),
            system_prompt: system_prompt.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &ChatId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id() == id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The chat's own system prompt, or `fallback` when it has none.
    pub fn effective_system_prompt<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.system_prompt.is_empty() {
            fallback
        } else {
            &self.system_prompt
        }
    }

    /// Bump `updated_at` to now. Never moves backwards.
    pub fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at);
    }

    /// Set a new title after trimming surrounding whitespace.
    pub fn rename(&mut self, title: &str) -> Result<(), DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::EmptyTitle);
        }
        self.title = title.to_string();
        self.touch();
        Ok(())
    }

    /// Append a message and return a reference to it.
    pub fn push_message(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        self.touch();
        // just pushed
        &self.messages[self.messages.len() - 1]
    }

    /// Replace the content of an assistant message.
    ///
    /// User and system messages are never rewritten.
    pub fn update_assistant_content(
        &mut self,
        id: &MessageId,
        content: impl Into<String>,
    ) -> Result<(), DomainError> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| DomainError::MessageNotFound(id.clone()))?;

        if message.role != Role::Assistant {
            return Err(DomainError::NotAssistantMessage(id.clone()));
        }

        message.content = content.into();
        self.touch();
        Ok(())
    }
}
