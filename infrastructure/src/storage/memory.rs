//! In-memory chat storage.

use std::collections::HashMap;
use std::sync::Mutex;
use talkback_application::ports::chat_storage::{ChatStorage, StorageError, StorageSlot};

/// Storage that lives only as long as the process
///
/// Used for `--ephemeral` sessions and as a stand-in when no data directory
/// can be determined.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<StorageSlot, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChatStorage for MemoryStorage {
    fn read(&self, slot: StorageSlot) -> Result<Option<String>, StorageError> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage poisoned".to_string()))?;
        Ok(slots.get(&slot).cloned())
    }

    fn write(&self, slot: StorageSlot, contents: &str) -> Result<(), StorageError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage poisoned".to_string()))?;
        slots.insert(slot, contents.to_string());
        Ok(())
    }
}
