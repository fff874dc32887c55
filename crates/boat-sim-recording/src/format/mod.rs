// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary bag format.
//!
//! A bag stores every sample received on a set of topics declared before
//! recording starts. Payloads are kept as encoded by the bus; the
//! serialization format is recorded per topic.

pub mod bag;

pub use bag::{
    BagReader, BagWriter, ChunkHeader, FileHeader, FormatError, IndexEntry, MessageIterator,
    FORMAT_VERSION, MAGIC,
};

use serde::{Deserialize, Serialize};

/// File extension of bag files.
pub const BAG_EXTENSION: &str = "bag";

/// A recorded sample.
#[derive(Debug, Clone, PartialEq)]
pub struct BagMessage {
    /// Receive time in nanoseconds since the Unix epoch.
    pub timestamp_nanos: u64,

    pub topic: String,

    pub type_name: String,

    /// Publisher sequence number.
    pub sequence_number: u64,

    /// Encoded payload.
    pub payload: Vec<u8>,
}

/// Bag metadata (JSON, stored at the end of the file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BagMetadata {
    /// Recording start time (RFC 3339).
    pub start_time: String,

    /// Recording end time (RFC 3339), set on finalize.
    pub end_time: Option<String>,

    /// Name of the recording node.
    pub recorder: String,

    /// Library version used for recording.
    pub version: String,

    /// Topics in registration order. Records refer to them by position.
    pub topics: Vec<TopicInfo>,

    pub description: Option<String>,
}

impl BagMetadata {
    pub fn new(recorder: &str) -> Self {
        Self {
            start_time: chrono::Utc::now().to_rfc3339(),
            end_time: None,
            recorder: recorder.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            topics: Vec::new(),
            description: None,
        }
    }

    pub fn topic(&self, name: &str) -> Option<&TopicInfo> {
        self.topics.iter().find(|t| t.name == name)
    }
}

/// A topic registered in a bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    pub name: String,

    pub type_name: String,

    /// Payload encoding (e.g. `"json"`).
    pub serialization_format: String,

    /// Number of messages recorded on this topic.
    pub message_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_defaults() {
        let meta = BagMetadata::new("data_collection_node");
        assert_eq!(meta.recorder, "data_collection_node");
        assert!(meta.topics.is_empty());
        assert!(meta.end_time.is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.start_time).is_ok());
    }

    #[test]
    fn test_metadata_topic_lookup() {
        let mut meta = BagMetadata::new("recorder");
        meta.topics.push(TopicInfo {
            name: "gps".into(),
            type_name: "GPS".into(),
            serialization_format: "json".into(),
            message_count: 0,
        });

        assert_eq!(meta.topic("gps").map(|t| t.type_name.as_str()), Some("GPS"));
        assert!(meta.topic("wind_sensors").is_none());
    }
}
