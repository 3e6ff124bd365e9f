//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use talkback_domain::StreamPersistence;

/// Raw storage configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Directory holding the chat list and settings files.
    /// Defaults to the platform data directory.
    pub dir: Option<String>,
    /// When streamed reply content is written
    pub stream_persistence: StreamPersistence,
}

impl FileStorageConfig {
    /// Resolve the data directory, expanding a leading `~`.
    pub fn data_dir(&self) -> Option<PathBuf> {
        match &self.dir {
            Some(dir) => Some(expand_home(dir)),
            None => dirs::data_dir().map(|d| d.join("talkback")),
        }
    }
}

/// Expand a leading `~/` to the home directory.
pub(crate) fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
