//! Key-value container for saved stages.

use crate::errors::StageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat key-value record describing one stage.
///
/// Serializes as a plain JSON object. Reads of missing or mistyped keys
/// return the type's zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageData(Map<String, Value>);

impl StageData {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a string.
    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), Value::String(value.into()));
    }

    /// Reads a string, or `""` if absent.
    #[must_use]
    pub fn get_string(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or_default()
    }

    /// Stores an integer.
    pub fn set_int(&mut self, key: &str, value: i64) {
        self.0.insert(key.to_string(), Value::from(value));
    }

    /// Reads an integer, or 0 if absent.
    #[must_use]
    pub fn get_int(&self, key: &str) -> i64 {
        self.0.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Serializes the record as a JSON object.
    pub fn to_json_string(&self) -> Result<String, StageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a record from a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, StageError> {
        Ok(serde_json::from_str(json)?)
    }
}
