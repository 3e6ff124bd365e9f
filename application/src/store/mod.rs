//! Chat session state and its persistence.

pub mod session_store;

pub use session_store::{SessionError, SessionState, SessionStore};
