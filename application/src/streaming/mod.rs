//! Reply stream ingestion

pub mod stream_ingestor;

pub use stream_ingestor::{IngestOutcome, IngestReport, ReplySink, StreamIngestor};
