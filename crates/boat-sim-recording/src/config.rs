// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data collection configuration.

use crate::json::TIME_KEY;
use boat_sim_core::msg;
use boat_sim_core::{Node, NodeError, ParamError, ParameterType};
use std::path::{Path, PathBuf};

/// A topic to record and its message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub name: String,
    pub type_name: String,
}

/// Data collection configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCollectionConfig {
    /// Base name of the output files (without extension).
    pub file_name: String,

    /// Directory the output files are written to.
    pub output_dir: PathBuf,

    /// Keep-last depth of each subscription.
    pub qos_depth: usize,

    pub topics: Vec<TopicSpec>,

    /// Record every sample to a bag file.
    pub bag: bool,

    /// Write periodic JSON snapshots.
    pub json: bool,

    /// Snapshot period in seconds.
    pub write_period_sec: f64,
}

impl DataCollectionConfig {
    /// Declare and read the node's parameters.
    pub fn from_node(node: &mut Node) -> Result<Self, NodeError> {
        node.declare_parameters(&[
            ("file_name", ParameterType::String),
            ("qos_depth", ParameterType::Integer),
            ("topics", ParameterType::StringArray),
            ("bag", ParameterType::Bool),
            ("json", ParameterType::Bool),
            ("write_period_sec", ParameterType::Double),
        ])?;

        let qos_depth = node.get_i64("qos_depth")?;
        let qos_depth = usize::try_from(qos_depth)
            .map_err(|_| ParamError::Invalid(format!("qos_depth must not be negative, got {}", qos_depth)))?;

        Ok(Self {
            file_name: node.get_string("file_name")?,
            output_dir: PathBuf::from("."),
            qos_depth,
            topics: parse_topics(&node.get_string_array("topics")?),
            bag: node.get_bool("bag")?,
            json: node.get_bool("json")?,
            write_period_sec: node.get_f64("write_period_sec")?,
        })
    }

    /// Write the output files to `dir` instead of the working directory.
    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Path of the output file with the given extension.
    pub fn output_path(&self, extension: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{}", self.file_name, extension))
    }
}

/// Split an alternating `name, type, name, type ...` list.
///
/// A trailing name without a type is dropped. Topics with an unknown message
/// type, and a topic named like the snapshot time key, are skipped.
pub fn parse_topics(list: &[String]) -> Vec<TopicSpec> {
    if list.len() % 2 != 0 {
        log::warn!(
            "topics list has an odd number of entries; ignoring trailing '{}'",
            list[list.len() - 1]
        );
    }

    list.chunks_exact(2)
        .filter_map(|pair| {
            let (name, type_name) = (&pair[0], &pair[1]);
            if name == TIME_KEY {
                log::error!(
                    "topic name '{}' is reserved for the snapshot time. Please adjust the topics array in globals.yaml",
                    name
                );
                return None;
            }
            if !msg::is_known_type(type_name) {
                log::error!(
                    "msg type {} does not exist. Please adjust the topics array in globals.yaml",
                    type_name
                );
                return None;
            }
            Some(TopicSpec {
                name: name.clone(),
                type_name: type_name.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use boat_sim_core::{Context, ParameterStore};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_topics_pairs() {
        let topics = parse_topics(&strings(&["gps", "GPS", "wind_sensors", "WindSensors"]));
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[1].name, "wind_sensors");
        assert_eq!(topics[1].type_name, "WindSensors");
    }

    #[test]
    fn test_parse_topics_skips_unknown_and_trailing() {
        let topics = parse_topics(&strings(&["gps", "GPS", "bogus", "NotAType", "dangling"]));
        assert_eq!(
            topics,
            vec![TopicSpec {
                name: "gps".into(),
                type_name: "GPS".into(),
            }]
        );
    }

    #[test]
    fn test_parse_topics_rejects_time_key() {
        let topics = parse_topics(&strings(&["time", "GPS", "gps", "GPS"]));
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].name, "gps");
    }

    #[test]
    fn test_from_node() {
        let store = ParameterStore::from_yaml_str(
            r#"
data_collection_node:
  ros__parameters:
    file_name: "run"
    qos_depth: 5
    topics: ["gps", "GPS"]
    bag: true
    json: false
    write_period_sec: 0.5
"#,
        )
        .expect("yaml");
        let context = Context::with_parameters(store);
        let mut node = Node::new(&context, "data_collection_node").expect("node");

        let config = DataCollectionConfig::from_node(&mut node)
            .expect("config")
            .with_output_dir("/tmp/out");
        assert_eq!(config.qos_depth, 5);
        assert!(config.bag);
        assert!(!config.json);
        assert_eq!(config.topics.len(), 1);
        assert_eq!(config.output_path("bag"), PathBuf::from("/tmp/out/run.bag"));
    }

    #[test]
    fn test_negative_depth_rejected() {
        let store = ParameterStore::from_yaml_str(
            r#"
/**:
  ros__parameters:
    file_name: "run"
    qos_depth: -1
    topics: []
    bag: false
    json: false
    write_period_sec: 0.5
"#,
        )
        .expect("yaml");
        let context = Context::with_parameters(store);
        let mut node = Node::new(&context, "data_collection_node").expect("node");

        assert!(matches!(
            DataCollectionConfig::from_node(&mut node),
            Err(NodeError::Param(ParamError::Invalid(_)))
        ));
    }
}
