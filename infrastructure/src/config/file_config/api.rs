//! Chat API configuration from TOML (`[api]` section)

use serde::{Deserialize, Serialize};
use talkback_domain::{DEFAULT_SYSTEM_PROMPT, Settings};

/// Raw chat API configuration
///
/// These values seed the default [`Settings`]; settings saved by the
/// application take precedence over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileApiConfig {
    /// Streaming chat endpoint URL
    pub endpoint: String,
    /// Bearer token
    pub api_key: String,
    /// Bot that answers
    pub bot_id: String,
    /// User id sent with every request
    pub user_id: String,
    /// Default system prompt for new chats
    pub system_prompt: String,
    /// HTTP timeout in seconds (`None` = no timeout)
    pub timeout_secs: Option<u64>,
}

impl Default for FileApiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            bot_id: String::new(),
            user_id: "talkback-user".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_secs: None,
        }
    }
}

impl FileApiConfig {
    /// Default settings used until the user saves their own.
    pub fn default_settings(&self) -> Settings {
        Settings {
            system_prompt: self.system_prompt.clone(),
            api_endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            bot_id: self.bot_id.clone(),
        }
    }
}
