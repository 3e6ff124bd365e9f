//! Session store: owner of the chat collection, settings and send flag.
//!
//! Every structural mutation re-serializes the whole chat collection and the
//! settings and writes both storage slots before returning. The only
//! exception is reply content during a stream when the store is configured
//! with [`StreamPersistence::OnFinish`]: those writes are deferred to
//! [`SessionStore::finish_reply`].

use crate::ports::chat_storage::{ChatStorage, StorageSlot};
use crate::streaming::ReplySink;
use chrono::Local;
use std::sync::Arc;
use talkback_domain::{
    Chat, ChatId, DomainError, Message, MessageId, Role, Settings, SettingsPatch,
    StreamPersistence, Turn, default_chat_title,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reasons a reply cannot be started
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("A reply is already being received")]
    AlreadySending,

    #[error("No active chat")]
    NoActiveChat,
}

/// In-memory session state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Newest first
    pub chats: Vec<Chat>,
    pub active_chat_id: Option<ChatId>,
    pub is_sending: bool,
}

/// The session store
///
/// Constructed explicitly and handed by `&mut` to whatever drives it; there
/// is no global instance. Call [`initialize`](Self::initialize) once before
/// use and [`shutdown`](Self::shutdown) before dropping.
pub struct SessionStore {
    state: SessionState,
    settings: Settings,
    default_settings: Settings,
    storage: Arc<dyn ChatStorage>,
    stream_persistence: StreamPersistence,
    deferred_write: bool,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn ChatStorage>) -> Self {
        Self {
            state: SessionState::default(),
            settings: Settings::default(),
            default_settings: Settings::default(),
            storage,
            stream_persistence: StreamPersistence::default(),
            deferred_write: false,
        }
    }

    /// Settings used when storage has none (or unreadable ones).
    pub fn with_default_settings(mut self, settings: Settings) -> Self {
        self.settings = settings.clone();
        self.default_settings = settings;
        self
    }

    pub fn with_stream_persistence(mut self, policy: StreamPersistence) -> Self {
        self.stream_persistence = policy;
        self
    }

    // ==================== Lifecycle ====================

    /// Load chats and settings from storage.
    ///
    /// Missing, unreadable or malformed data falls back to an empty chat
    /// collection and the default settings. Never fails.
    pub fn initialize(&mut self) {
        self.state = SessionState {
            chats: self.load_chats(),
            active_chat_id: None,
            is_sending: false,
        };
        self.settings = self.load_settings();
        self.deferred_write = false;

        info!("Session store initialized with {} chats", self.state.chats.len());
    }

    /// End the lifecycle: drop any in-flight reply state and write everything.
    pub fn shutdown(&mut self) {
        if self.state.is_sending {
            debug!("Shutting down with a reply in flight");
        }
        self.state.is_sending = false;
        self.persist();
        info!("Session store shut down");
    }

    fn load_chats(&self) -> Vec<Chat> {
        match self.storage.read(StorageSlot::ChatList) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Chat>>(&json) {
                Ok(chats) => chats,
                Err(e) => {
                    warn!("Discarding unreadable chat list: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read chat list: {}", e);
                Vec::new()
            }
        }
    }

    fn load_settings(&self) -> Settings {
        let defaults = self.default_settings.clone();
        match self.storage.read(StorageSlot::AppSettings) {
            Ok(Some(json)) => match serde_json::from_str::<SettingsPatch>(&json) {
                Ok(patch) => defaults.merged(patch),
                Err(e) => {
                    warn!("Discarding unreadable settings: {}", e);
                    defaults
                }
            },
            Ok(None) => defaults,
            Err(e) => {
                warn!("Could not read settings: {}", e);
                defaults
            }
        }
    }

    /// Serialize the whole chat collection and settings and write both slots.
    ///
    /// Write failures are logged; in-memory state stays authoritative.
    fn persist(&mut self) {
        self.deferred_write = false;

        match serde_json::to_string(&self.state.chats) {
            Ok(json) => {
                if let Err(e) = self.storage.write(StorageSlot::ChatList, &json) {
                    warn!("Failed to persist chat list: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize chat list: {}", e),
        }

        match serde_json::to_string(&self.settings) {
            Ok(json) => {
                if let Err(e) = self.storage.write(StorageSlot::AppSettings, &json) {
                    warn!("Failed to persist settings: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize settings: {}", e),
        }
    }

    // ==================== Read access ====================

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn chats(&self) -> &[Chat] {
        &self.state.chats
    }

    pub fn chat(&self, id: &ChatId) -> Option<&Chat> {
        self.state.chats.iter().find(|c| c.id() == id)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn active_chat_id(&self) -> Option<&ChatId> {
        self.state.active_chat_id.as_ref()
    }

    pub fn is_sending(&self) -> bool {
        self.state.is_sending
    }

    /// The chat referenced by the active id, if it exists.
    pub fn active_chat(&self) -> Option<&Chat> {
        let id = self.state.active_chat_id.as_ref()?;
        self.chat(id)
    }

    /// The sequence submitted to the chat API: the effective system prompt
    /// followed by every message of the active chat. Empty without one.
    pub fn api_message_sequence(&self) -> Vec<Turn> {
        let Some(chat) = self.active_chat() else {
            return Vec::new();
        };

        let mut turns = Vec::with_capacity(chat.messages().len() + 1);
        turns.push(Turn::new(
            Role::System,
            chat.effective_system_prompt(&self.settings.system_prompt),
        ));
        turns.extend(chat.messages().iter().map(Turn::from));
        turns
    }

    fn chat_mut(&mut self, id: &ChatId) -> Option<&mut Chat> {
        self.state.chats.iter_mut().find(|c| c.id() == id)
    }

    fn active_chat_mut(&mut self) -> Option<&mut Chat> {
        let id = self.state.active_chat_id.clone()?;
        self.chat_mut(&id)
    }

    // ==================== Chat management ====================

    /// Create an empty chat at the front of the list and return its id.
    pub fn create_chat(&mut self) -> ChatId {
        let chat = Chat::new(
            default_chat_title(Local::now()),
            self.settings.system_prompt.clone(),
        );
        let id = chat.id().clone();
        self.state.chats.insert(0, chat);
        self.persist();

        debug!("Created chat {}", id);
        id
    }

    /// Remove a chat. Returns false (and writes nothing) if it did not exist.
    ///
    /// Deleting the active chat clears the active pointer.
    pub fn delete_chat(&mut self, id: &ChatId) -> bool {
        let Some(index) = self.state.chats.iter().position(|c| c.id() == id) else {
            return false;
        };

        self.state.chats.remove(index);
        if self.state.active_chat_id.as_ref() == Some(id) {
            self.state.active_chat_id = None;
        }
        self.persist();

        debug!("Deleted chat {}", id);
        true
    }

    /// Rename a chat. Blank titles and unknown ids are ignored.
    pub fn rename_chat(&mut self, id: &ChatId, title: &str) -> bool {
        let Some(chat) = self.chat_mut(id) else {
            return false;
        };

        match chat.rename(title) {
            Ok(()) => {
                self.persist();
                true
            }
            Err(e) => {
                debug!("Rename of {} ignored: {}", id, e);
                false
            }
        }
    }

    /// Point the active chat at `id`.
    ///
    /// The id is not checked; an unknown id leaves [`active_chat`](Self::active_chat)
    /// returning `None` until a valid id is set.
    pub fn set_active_chat(&mut self, id: impl Into<ChatId>) {
        self.state.active_chat_id = Some(id.into());
    }

    // ==================== Message management ====================

    /// Append a new message to the active chat.
    ///
    /// Returns `None` and writes nothing when there is no active chat.
    pub fn append_message(&mut self, role: Role, content: impl Into<String>) -> Option<Message> {
        self.push_message(Message::new(role, content))
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) -> Option<Message> {
        self.append_message(Role::User, content)
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) -> Option<Message> {
        self.append_message(Role::Assistant, content)
    }

    /// Append an already built message (e.g. one carrying an image URL).
    pub fn push_message(&mut self, message: Message) -> Option<Message> {
        let chat = self.active_chat_mut()?;
        let appended = chat.push_message(message).clone();
        self.persist();
        Some(appended)
    }

    /// Replace the content of an assistant message in the active chat.
    ///
    /// User and system messages are never touched. Returns whether the
    /// content was applied.
    pub fn update_message_content(&mut self, id: &MessageId, content: impl Into<String>) -> bool {
        let Some(chat) = self.active_chat_mut() else {
            return false;
        };

        if let Err(e) = chat.update_assistant_content(id, content) {
            match &e {
                DomainError::NotAssistantMessage(_) => warn!("Refusing to rewrite {}", e),
                _ => debug!("Content update skipped: {}", e),
            }
            return false;
        }

        if self.state.is_sending && self.stream_persistence.defers_fragments() {
            self.deferred_write = true;
        } else {
            self.persist();
        }
        true
    }

    // ==================== Replies ====================

    /// Create the empty assistant placeholder and raise the sending flag.
    pub fn begin_reply(&mut self) -> Result<MessageId, SessionError> {
        if self.state.is_sending {
            return Err(SessionError::AlreadySending);
        }
        let placeholder = self
            .add_assistant_message("")
            .ok_or(SessionError::NoActiveChat)?;

        self.state.is_sending = true;
        Ok(placeholder.id().clone())
    }

    /// Clear the sending flag and write any deferred reply content.
    pub fn finish_reply(&mut self) {
        self.state.is_sending = false;
        if self.deferred_write {
            self.persist();
        }
    }

    // ==================== Settings ====================

    /// Shallow-merge a partial settings update.
    pub fn update_settings(&mut self, patch: SettingsPatch) {
        self.settings.merge(patch);
        self.persist();
    }

    /// Set the default system prompt used for new chats.
    pub fn update_default_system_prompt(&mut self, prompt: &str) {
        self.update_settings(SettingsPatch::system_prompt(prompt.trim()));
    }
}

impl ReplySink for SessionStore {
    fn apply(&mut self, target: &MessageId, content: &str) -> bool {
        self.update_message_content(target, content)
    }
}
