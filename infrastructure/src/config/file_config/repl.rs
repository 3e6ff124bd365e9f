//! REPL configuration from TOML (`[repl]` section)

use super::storage::expand_home;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw REPL configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Show a spinner while waiting for the first fragment
    pub show_progress: bool,
    /// Path to the line-editor history file
    pub history_file: Option<String>,
    /// Input prompt
    pub prompt: String,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
            prompt: "you> ".to_string(),
        }
    }
}

impl FileReplConfig {
    /// History file path, defaulting to `<data dir>/talkback/history.txt`.
    pub fn history_path(&self) -> Option<PathBuf> {
        match &self.history_file {
            Some(path) => Some(expand_home(path)),
            None => dirs::data_dir().map(|d| d.join("talkback").join("history.txt")),
        }
    }
}
