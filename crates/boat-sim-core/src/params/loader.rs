// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Loader for ROS-style globals files.
//!
//! ```yaml
//! /**:
//!   ros__parameters:
//!     pub_period_sec: 0.5
//!
//! data_collection_node:
//!   ros__parameters:
//!     file_name: "sim_run"
//!     topics: ["gps", "GPS"]
//! ```
//!
//! The `/**` section applies to every node. A node section overrides the
//! wildcard value for the same parameter name. Leading slashes on node names
//! are ignored.

use super::{ParamError, ParameterValue};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::Path;

const PARAMETERS_KEY: &str = "ros__parameters";
const WILDCARD_NODE: &str = "**";

/// Parameter values for every node of the process.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    nodes: HashMap<String, Mapping>,
}

impl ParameterStore {
    /// Load a globals file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParamError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Parse globals from a YAML string.
    pub fn from_yaml_str(text: &str) -> Result<Self, ParamError> {
        let doc: Value = serde_yaml::from_str(text)?;
        let root = match doc {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(root) => root,
            _ => {
                return Err(ParamError::Invalid(
                    "top level must be a mapping of node names".to_string(),
                ))
            }
        };

        let mut nodes = HashMap::new();
        for (key, section) in root {
            let name = key
                .as_str()
                .ok_or_else(|| ParamError::Invalid(format!("node name {:?} is not a string", key)))?;
            let name = name.trim_start_matches('/');

            let params = section
                .get(PARAMETERS_KEY)
                .and_then(Value::as_mapping)
                .ok_or_else(|| {
                    ParamError::Invalid(format!("node '{}' has no {} mapping", name, PARAMETERS_KEY))
                })?;

            nodes.insert(name.to_string(), params.clone());
        }

        Ok(Self { nodes })
    }

    /// Raw value of a parameter for a node, falling back to the wildcard section.
    pub(crate) fn lookup(&self, node: &str, name: &str) -> Option<&Value> {
        let node = node.trim_start_matches('/');
        self.nodes
            .get(node)
            .and_then(|params| params.get(name))
            .or_else(|| self.nodes.get(WILDCARD_NODE).and_then(|params| params.get(name)))
    }

    /// Set a parameter value for a node (`"**"` for every node).
    pub fn set(&mut self, node: &str, name: &str, value: ParameterValue) {
        self.nodes
            .entry(node.trim_start_matches('/').to_string())
            .or_default()
            .insert(Value::String(name.to_string()), value.into_yaml());
    }

    /// Node names with an explicit section.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOBALS: &str = r#"
/**:
  ros__parameters:
    pub_period_sec: 0.5
    qos_depth: 10

/data_collection_node:
  ros__parameters:
    qos_depth: 5
    file_name: "run"
"#;

    #[test]
    fn test_wildcard_fallback() {
        let store = ParameterStore::from_yaml_str(GLOBALS).expect("parse");

        assert_eq!(
            store.lookup("physics_engine_node", "pub_period_sec"),
            Some(&Value::from(0.5))
        );
        assert_eq!(store.lookup("data_collection_node", "qos_depth"), Some(&Value::from(5)));
        assert_eq!(store.lookup("physics_engine_node", "qos_depth"), Some(&Value::from(10)));
        assert!(store.lookup("physics_engine_node", "file_name").is_none());
    }

    #[test]
    fn test_missing_ros_parameters() {
        let err = ParameterStore::from_yaml_str("node:\n  foo: 1\n").expect_err("invalid");
        assert!(matches!(err, ParamError::Invalid(_)));
    }

    #[test]
    fn test_empty_document() {
        let store = ParameterStore::from_yaml_str("").expect("parse");
        assert_eq!(store.node_names().count(), 0);
    }

    #[test]
    fn test_set_overrides() {
        let mut store = ParameterStore::from_yaml_str(GLOBALS).expect("parse");
        store.set("physics_engine_node", "pub_period_sec", ParameterValue::Double(0.1));

        assert_eq!(
            store.lookup("physics_engine_node", "pub_period_sec"),
            Some(&Value::from(0.1))
        );
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("globals.yaml");
        std::fs::write(&path, GLOBALS).expect("write");

        let store = ParameterStore::from_file(&path).expect("load");
        assert!(store.node_names().any(|n| n == "data_collection_node"));

        let missing = ParameterStore::from_file(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(ParamError::Io(_))));
    }
}
