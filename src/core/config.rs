//! Executor Configuration
//!
//! The only setting is the filter search path: an ordered list of filter
//! library names. A single string is accepted and normalized to a
//! one-element list.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, CoreResult};

/// Configuration for an [`Executor`](super::executor::Executor).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Filter libraries searched in order when resolving a filter name.
    #[serde(default, deserialize_with = "deserialize_path")]
    pub path: Vec<String>,
}

impl ExecutorConfig {
    pub fn new(path: impl Into<SearchPath>) -> Self {
        Self {
            path: path.into().0,
        }
    }

    /// Parse configuration from a JSON document.
    pub fn from_json_str(input: &str) -> CoreResult<Self> {
        serde_json::from_str(input).map_err(|e| CoreError::config(e.to_string()))
    }

    /// Load configuration from a JSON file.
    pub fn load(file: impl AsRef<Path>) -> CoreResult<Self> {
        let file = file.as_ref();
        let raw = fs::read_to_string(file)
            .map_err(|e| CoreError::config(format!("{}: {}", file.display(), e)))?;
        Self::from_json_str(&raw)
    }
}

impl From<&str> for ExecutorConfig {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<Vec<String>> for ExecutorConfig {
    fn from(path: Vec<String>) -> Self {
        Self::new(path)
    }
}

/// Ordered search path, built from one name or many.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath(pub Vec<String>);

impl From<&str> for SearchPath {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for SearchPath {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for SearchPath {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<&[&str]> for SearchPath {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for SearchPath {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|n| n.to_string()).collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PathValue {
    One(String),
    Many(Vec<String>),
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match PathValue::deserialize(deserializer)? {
        PathValue::One(name) => vec![name],
        PathValue::Many(names) => names,
    })
}
