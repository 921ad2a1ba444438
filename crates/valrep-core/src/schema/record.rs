//! Output record addressed by dotted paths.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;

/// Structured result for one document.
///
/// Wraps the JSON object produced from the schema template. Only paths
/// already present in the template can be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    /// Start a record from a template object.
    pub fn from_template(template: Value) -> Result<Self, SchemaError> {
        if !template.is_object() {
            return Err(SchemaError::InvalidTemplate);
        }
        Ok(Self(template))
    }

    /// Value at a dotted path, if the path exists.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |current, segment| current.as_object()?.get(segment))
    }

    /// Whether the template defines `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Overwrite the value at an existing path.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), SchemaError> {
        *self.slot_mut(path)? = value;
        Ok(())
    }

    /// Replace the section at `to` with a copy of the section at `from`.
    pub fn copy_section(&mut self, from: &str, to: &str) -> Result<(), SchemaError> {
        let section = self
            .get(from)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownPath(from.to_string()))?;
        self.set(to, section)
    }

    fn slot_mut(&mut self, path: &str) -> Result<&mut Value, SchemaError> {
        let mut current = &mut self.0;
        for segment in path.split('.') {
            let map = current
                .as_object_mut()
                .ok_or_else(|| SchemaError::NotAnObject {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?;
            current = map
                .get_mut(segment)
                .ok_or_else(|| SchemaError::UnknownPath(path.to_string()))?;
        }
        Ok(current)
    }
}
