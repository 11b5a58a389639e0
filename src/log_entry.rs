use serde::{Deserialize, Serialize};

/// A single captured scan, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp of the capture
    pub timestamp: String,
    /// Display text derived from the tag payload
    pub summary: String,
    /// JSON serialization of the raw tag data, kept for inspection
    #[serde(rename = "rawPayload")]
    pub raw_payload: String,
}

impl LogEntry {
    pub fn new(timestamp: String, summary: String, raw_payload: String) -> Self {
        Self {
            timestamp,
            summary,
            raw_payload,
        }
    }
}
