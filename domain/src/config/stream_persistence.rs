//! Stream persistence policy value object

use serde::{Deserialize, Serialize};

/// When content updates made during a streamed reply reach storage.
///
/// Either way the placeholder message is written when it is created and the
/// final content is written when the stream ends, so a crash mid-stream
/// loses at most the in-flight reply text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPersistence {
    /// Write the full collection after every fragment.
    PerFragment,
    /// Defer fragment writes and write once when the stream ends (default)
    #[default]
    OnFinish,
}

impl StreamPersistence {
    pub fn defers_fragments(&self) -> bool {
        matches!(self, StreamPersistence::OnFinish)
    }
}

impl std::str::FromStr for StreamPersistence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_fragment" | "per-fragment" | "fragment" => Ok(Self::PerFragment),
            "on_finish" | "on-finish" | "finish" => Ok(Self::OnFinish),
            other => Err(format!("unknown stream persistence: {other}")),
        }
    }
}
