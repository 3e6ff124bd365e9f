//! Wire types for the remote chat API request.
//!
//! The request body is a bot-style streaming chat call:
//!
//! ```json
//! { "bot_id": "...", "user_id": "...", "stream": true,
//!   "additional_messages": [{ "role": "user", "content": "Hi", "content_type": "text" }] }
//! ```

use super::entities::{Role, Turn};
use serde::{Deserialize, Serialize};

/// Roles accepted by the remote API. System prompts are not sent as turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiRole {
    User,
    Assistant,
}

impl TryFrom<Role> for ApiRole {
    type Error = Role;

    fn try_from(role: Role) -> Result<Self, Self::Error> {
        match role {
            Role::User => Ok(ApiRole::User),
            Role::Assistant => Ok(ApiRole::Assistant),
            Role::System => Err(role),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
}

/// One message in the API request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: ApiRole,
    pub content: String,
    pub content_type: ContentType,
}

impl ApiMessage {
    pub fn text(role: ApiRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            content_type: ContentType::Text,
        }
    }

    /// Convert a turn sequence into API messages.
    ///
    /// System turns have no API role and are dropped, as are turns with
    /// empty content (e.g. an assistant reply that failed before its first
    /// fragment).
    pub fn from_turns(turns: &[Turn]) -> Vec<Self> {
        turns
            .iter()
            .filter(|turn| !turn.content.is_empty())
            .filter_map(|turn| {
                ApiRole::try_from(turn.role)
                    .ok()
                    .map(|role| Self::text(role, turn.content.clone()))
            })
            .collect()
    }
}

/// Request body for a streaming chat call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub bot_id: String,
    pub user_id: String,
    pub additional_messages: Vec<ApiMessage>,
    pub stream: bool,
}

impl ChatPayload {
    pub fn streaming(
        bot_id: impl Into<String>,
        user_id: impl Into<String>,
        messages: Vec<ApiMessage>,
    ) -> Self {
        Self {
            bot_id: bot_id.into(),
            user_id: user_id.into(),
            additional_messages: messages,
            stream: true,
        }
    }
}
