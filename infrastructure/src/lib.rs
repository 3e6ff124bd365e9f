//! Infrastructure layer for talkback
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod storage;
pub mod transport;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileApiConfig, FileConfig, FileLogConfig,
    FileReplConfig, FileStorageConfig, FileTransportConfig,
};
pub use logging::JsonlConversationLogger;
pub use storage::{JsonFileStorage, MemoryStorage};
pub use transport::{CozeHttpTransport, MockStreamTransport};
