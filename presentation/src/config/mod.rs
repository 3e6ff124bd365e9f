//! Presentation-level configuration
//!
//! Configuration for REPL behavior, resolved from the `[repl]` file section
//! and command-line flags by the binary.

use std::path::PathBuf;

/// REPL configuration for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplConfig {
    /// Show a spinner until the first reply fragment
    pub show_progress: bool,
    /// Line-editor history file (`None` = no history)
    pub history_file: Option<PathBuf>,
    /// Input prompt
    pub prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
            prompt: "you> ".to_string(),
        }
    }
}
