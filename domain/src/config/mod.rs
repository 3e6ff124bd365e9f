//! Configuration value objects shared by the outer layers.
//!
//! - [`StreamPersistence`]: when streamed reply content is written to storage
//! - [`ConfigIssue`]: a detected problem in a loaded configuration

mod issue;
mod stream_persistence;

pub use issue::{ConfigIssue, ConfigIssueCode, Severity};
pub use stream_persistence::StreamPersistence;
