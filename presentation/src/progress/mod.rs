//! Progress display for streamed replies

pub mod reporter;
