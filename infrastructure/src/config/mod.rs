//! Configuration file loading for talkback
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TALKBACK_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./talkback.toml` or `./.talkback.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/talkback/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileApiConfig, FileConfig, FileLogConfig, FileReplConfig,
    FileStorageConfig, FileTransportConfig,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
