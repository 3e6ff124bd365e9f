//! Chat storage port
//!
//! Persistent storage is a pair of named slots holding JSON text: one for the
//! serialized chat collection and one for the serialized settings. The session
//! store writes both after every mutation, so implementations only need
//! whole-value reads and writes.

use thiserror::Error;

/// Named storage slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageSlot {
    /// Serialized `Vec<Chat>`
    ChatList,
    /// Serialized `Settings`
    AppSettings,
}

impl StorageSlot {
    pub const ALL: [StorageSlot; 2] = [StorageSlot::ChatList, StorageSlot::AppSettings];

    /// Stable key of the slot, e.g. for file names.
    pub fn key(&self) -> &'static str {
        match self {
            StorageSlot::ChatList => "chat-list",
            StorageSlot::AppSettings => "app-settings",
        }
    }
}

impl std::fmt::Display for StorageSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors that can occur while reading or writing a slot
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on slot '{slot}': {source}")]
    Io {
        slot: StorageSlot,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage for the chat collection and settings
///
/// Reads return `Ok(None)` for a slot that has never been written.
pub trait ChatStorage: Send + Sync {
    fn read(&self, slot: StorageSlot) -> Result<Option<String>, StorageError>;

    fn write(&self, slot: StorageSlot, contents: &str) -> Result<(), StorageError>;
}
