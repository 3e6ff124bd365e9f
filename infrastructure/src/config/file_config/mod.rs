//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod api;
mod log;
mod repl;
mod storage;
mod transport;

pub use api::FileApiConfig;
pub use log::FileLogConfig;
pub use repl::FileReplConfig;
pub use storage::FileStorageConfig;
pub use transport::FileTransportConfig;

use serde::{Deserialize, Serialize};
use talkback_domain::{ConfigIssue, ConfigIssueCode};
use thiserror::Error;

/// Configuration that cannot be used at all
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("api.timeout_secs cannot be 0")]
    InvalidTimeout,

    #[error("repl.prompt cannot be empty")]
    EmptyPrompt,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Chat API connection and default settings
    pub api: FileApiConfig,
    /// Where chats and settings are stored
    pub storage: FileStorageConfig,
    /// Real or mock transport
    pub transport: FileTransportConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Conversation transcript
    pub log: FileLogConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Warnings describe a configuration that loads but will probably not
    /// get a reply (e.g. no endpoint outside mock mode). Errors are the
    /// same conditions [`check`](Self::check) rejects.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !self.transport.mock {
            for (field, value) in [
                ("api.endpoint", &self.api.endpoint),
                ("api.api_key", &self.api.api_key),
                ("api.bot_id", &self.api.bot_id),
            ] {
                if value.trim().is_empty() {
                    issues.push(ConfigIssue::warning(
                        ConfigIssueCode::MissingValue {
                            field: field.to_string(),
                        },
                        format!("{field} is empty; set it in a config file, TALKBACK_* or /settings"),
                    ));
                }
            }
        }

        if self.api.timeout_secs == Some(0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidValue {
                    field: "api.timeout_secs".to_string(),
                    value: "0".to_string(),
                },
                ConfigValidationError::InvalidTimeout.to_string(),
            ));
        }

        if self.repl.prompt.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingValue {
                    field: "repl.prompt".to_string(),
                },
                ConfigValidationError::EmptyPrompt.to_string(),
            ));
        }

        issues
    }

    /// Reject configurations that cannot be used.
    pub fn check(&self) -> Result<(), ConfigValidationError> {
        if self.api.timeout_secs == Some(0) {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.repl.prompt.is_empty() {
            return Err(ConfigValidationError::EmptyPrompt);
        }
        Ok(())
    }
}
