//! Application settings value object.
//!
//! [`Settings`] is the process-wide singleton that holds the API connection
//! details and the default system prompt. [`SettingsPatch`] is its partial
//! form: every field optional, merged shallowly on top of the current value.

use serde::{Deserialize, Serialize};

/// System prompt used when neither the chat nor the settings provide one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Global application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub system_prompt: String,
    pub api_endpoint: String,
    pub api_key: String,
    #[serde(alias = "cozeBotId")]
    pub bot_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            api_endpoint: String::new(),
            api_key: String::new(),
            bot_id: String::new(),
        }
    }
}

impl Settings {
    /// Shallow-merge `patch` into these settings. `None` fields are kept.
    pub fn merge(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.system_prompt {
            self.system_prompt = v;
        }
        if let Some(v) = patch.api_endpoint {
            self.api_endpoint = v;
        }
        if let Some(v) = patch.api_key {
            self.api_key = v;
        }
        if let Some(v) = patch.bot_id {
            self.bot_id = v;
        }
    }

    /// Return a copy with `patch` merged in.
    pub fn merged(mut self, patch: SettingsPatch) -> Self {
        self.merge(patch);
        self
    }

    /// API key with everything but the last four characters hidden.
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let visible: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}

/// Partial settings update
///
/// Also used to read persisted settings: fields missing from stored JSON
/// leave the seeded defaults in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "cozeBotId")]
    pub bot_id: Option<String>,
}

impl SettingsPatch {
    pub fn system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            system_prompt: Some(settings.system_prompt),
            api_endpoint: Some(settings.api_endpoint),
            api_key: Some(settings.api_key),
            bot_id: Some(settings.bot_id),
        }
    }
}
