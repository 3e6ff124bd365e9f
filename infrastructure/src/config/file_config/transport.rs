//! Transport configuration from TOML (`[transport]` section)

use serde::{Deserialize, Serialize};

/// Raw transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTransportConfig {
    /// Replay a canned reply instead of calling the API
    pub mock: bool,
    /// Delay between mock fragments in milliseconds
    pub mock_delay_ms: u64,
}

impl Default for FileTransportConfig {
    fn default() -> Self {
        Self {
            mock: false,
            mock_delay_ms: 100,
        }
    }
}
