//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod chat_storage;
pub mod chat_transport;
pub mod conversation_logger;
pub mod progress;
