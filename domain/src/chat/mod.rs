//! Chat domain.
//!
//! - [`entities::Chat`]: a persisted conversation
//! - [`entities::Message`]: a single turn within a chat
//! - [`settings::Settings`]: process-wide API and prompt settings
//! - [`api`]: request body sent to the remote chat API

pub mod api;
pub mod entities;
pub mod settings;
pub mod value_objects;
