//! Conversation log configuration from TOML (`[log]` section)

use super::storage::expand_home;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw log configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLogConfig {
    /// JSONL transcript of requests and replies (disabled when unset)
    pub conversation_log: Option<String>,
}

impl FileLogConfig {
    pub fn conversation_log_path(&self) -> Option<PathBuf> {
        self.conversation_log.as_deref().map(expand_home)
    }
}
