//! File-backed chat storage.
//!
//! Each slot is one JSON file named after the slot key inside a data
//! directory (`chat-list.json`, `app-settings.json`). Writes go to a
//! temporary file in the same directory which is synced and then renamed
//! over the target, so a crash never leaves a half-written slot behind.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use talkback_application::ports::chat_storage::{ChatStorage, StorageError, StorageSlot};
use tracing::trace;

/// JSON file storage rooted at a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    /// Create a storage in `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `slot`.
    pub fn slot_path(&self, slot: StorageSlot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.key()))
    }

    fn temp_path(&self, slot: StorageSlot) -> PathBuf {
        self.dir.join(format!(".{}.json.tmp", slot.key()))
    }

    fn write_atomic(&self, slot: StorageSlot, contents: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let tmp_path = self.temp_path(slot);
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(contents.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, self.slot_path(slot))
    }
}

impl ChatStorage for JsonFileStorage {
    fn read(&self, slot: StorageSlot) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(contents) if contents.trim().is_empty() => Ok(None),
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { slot, source }),
        }
    }

    fn write(&self, slot: StorageSlot, contents: &str) -> Result<(), StorageError> {
        trace!("Writing {} bytes to {}", contents.len(), slot);
        self.write_atomic(slot, contents)
            .map_err(|source| StorageError::Io { slot, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_slot_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());

        assert!(storage.read(StorageSlot::ChatList).unwrap().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested").join("data"));

        storage.write(StorageSlot::ChatList, "[]").unwrap();
        storage
            .write(StorageSlot::AppSettings, r#"{"apiKey":"k"}"#)
            .unwrap();

        assert_eq!(
            storage.read(StorageSlot::ChatList).unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(
            storage.read(StorageSlot::AppSettings).unwrap().as_deref(),
            Some(r#"{"apiKey":"k"}"#)
        );
        assert!(storage.slot_path(StorageSlot::ChatList).ends_with("chat-list.json"));
    }

    #[test]
    fn test_overwrite_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());

        storage.write(StorageSlot::ChatList, "[1]").unwrap();
        storage.write(StorageSlot::ChatList, "[2]").unwrap();

        assert_eq!(
            storage.read(StorageSlot::ChatList).unwrap().as_deref(),
            Some("[2]")
        );
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["chat-list.json".to_string()]);
    }

    #[test]
    fn test_empty_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        fs::write(storage.slot_path(StorageSlot::AppSettings), "  \n").unwrap();

        assert!(storage.read(StorageSlot::AppSettings).unwrap().is_none());
    }

    #[test]
    fn test_unreadable_slot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        // A directory where the file should be
        fs::create_dir_all(storage.slot_path(StorageSlot::ChatList)).unwrap();

        let err = storage.read(StorageSlot::ChatList).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Io {
                slot: StorageSlot::ChatList,
                ..
            }
        ));
    }
}
