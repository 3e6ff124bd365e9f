//! Reply stream framing.
//!
//! - [`sse::SseDecoder`]: bytes to server-sent events
//! - [`frame::decode_payload`]: one `data:` payload to an [`frame::SseFrame`]

pub mod frame;
pub mod sse;
