// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed node parameters.

mod loader;

pub use loader::ParameterStore;

use serde_yaml::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Parameter errors.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("Failed to read parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse parameter file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid parameter file: {0}")]
    Invalid(String),

    #[error("Parameter '{name}' is not set for node '{node}'")]
    Missing { node: String, name: String },

    #[error("Parameter '{name}' is not of type {expected:?}")]
    WrongType { name: String, expected: ParameterType },

    #[error("Parameter '{0}' was not declared")]
    Undeclared(String),
}

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Double,
    Integer,
    Bool,
    String,
    StringArray,
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Double(f64),
    Integer(i64),
    Bool(bool),
    String(String),
    StringArray(Vec<String>),
}

impl ParameterValue {
    /// Convert a YAML value to the declared type.
    ///
    /// Integers are accepted where a double is declared.
    fn from_yaml(ty: ParameterType, value: &Value) -> Option<Self> {
        match ty {
            ParameterType::Double => value.as_f64().map(Self::Double),
            ParameterType::Integer => value.as_i64().map(Self::Integer),
            ParameterType::Bool => value.as_bool().map(Self::Bool),
            ParameterType::String => value.as_str().map(|s| Self::String(s.to_string())),
            ParameterType::StringArray => value
                .as_sequence()?
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Self::StringArray),
        }
    }

    pub(crate) fn into_yaml(self) -> Value {
        match self {
            Self::Double(v) => Value::from(v),
            Self::Integer(v) => Value::from(v),
            Self::Bool(v) => Value::Bool(v),
            Self::String(v) => Value::String(v),
            Self::StringArray(v) => Value::Sequence(v.into_iter().map(Value::String).collect()),
        }
    }

    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Self::Double(_) => ParameterType::Double,
            Self::Integer(_) => ParameterType::Integer,
            Self::Bool(_) => ParameterType::Bool,
            Self::String(_) => ParameterType::String,
            Self::StringArray(_) => ParameterType::StringArray,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Double(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::StringArray(v) => write!(f, "[{}]", v.join(", ")),
        }
    }
}

/// Parameters declared by one node.
#[derive(Debug, Default)]
pub(crate) struct Parameters {
    declared: HashMap<String, ParameterValue>,
}

impl Parameters {
    /// Declare a parameter, reading its value from the store.
    pub(crate) fn declare(
        &mut self,
        store: &ParameterStore,
        node: &str,
        name: &str,
        ty: ParameterType,
    ) -> Result<&ParameterValue, ParamError> {
        let raw = store.lookup(node, name).ok_or_else(|| ParamError::Missing {
            node: node.to_string(),
            name: name.to_string(),
        })?;
        let value = ParameterValue::from_yaml(ty, raw).ok_or_else(|| ParamError::WrongType {
            name: name.to_string(),
            expected: ty,
        })?;

        self.declared.insert(name.to_string(), value);
        self.get(name)
    }

    pub(crate) fn get(&self, name: &str) -> Result<&ParameterValue, ParamError> {
        self.declared
            .get(name)
            .ok_or_else(|| ParamError::Undeclared(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ParameterStore {
        ParameterStore::from_yaml_str(
            r#"
node:
  ros__parameters:
    period: 2
    depth: 10
    enabled: true
    topics: ["gps", "GPS"]
    mixed: ["gps", 3]
"#,
        )
        .expect("parse")
    }

    #[test]
    fn test_declare_typed() {
        let store = store();
        let mut params = Parameters::default();

        let period = params
            .declare(&store, "node", "period", ParameterType::Double)
            .expect("double");
        assert_eq!(period, &ParameterValue::Double(2.0));

        params
            .declare(&store, "node", "topics", ParameterType::StringArray)
            .expect("array");
        assert_eq!(
            params.get("topics").expect("declared"),
            &ParameterValue::StringArray(vec!["gps".into(), "GPS".into()])
        );
    }

    #[test]
    fn test_declare_errors() {
        let store = store();
        let mut params = Parameters::default();

        assert!(matches!(
            params.declare(&store, "node", "enabled", ParameterType::Integer),
            Err(ParamError::WrongType { .. })
        ));
        assert!(matches!(
            params.declare(&store, "node", "mixed", ParameterType::StringArray),
            Err(ParamError::WrongType { .. })
        ));
        assert!(matches!(
            params.declare(&store, "node", "absent", ParameterType::Bool),
            Err(ParamError::Missing { .. })
        ));
        assert!(matches!(params.get("depth"), Err(ParamError::Undeclared(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(ParameterValue::Double(0.5).to_string(), "0.5");
        assert_eq!(
            ParameterValue::StringArray(vec!["a".into(), "b".into()]).to_string(),
            "[a, b]"
        );
    }
}
