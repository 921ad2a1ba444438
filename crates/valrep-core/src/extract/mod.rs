//! Spatial and textual field matching over a fragment corpus.

pub mod anchor;
pub mod checkbox;
mod engine;
pub mod normalize;
pub mod numeric;
pub mod patterns;
pub mod proximity;

pub use anchor::{locate, MatchMode};
pub use checkbox::CheckboxRules;
pub use engine::FieldExtractor;
pub use normalize::{KeywordRules, NormalizationRule, Normalizer};
pub use proximity::{nearby, search, Candidate, Direction};

use serde::{Deserialize, Serialize};

/// A value resolved for one schema field.
///
/// Absence is expressed as `Option<FieldValue>::None`, so a boolean that was
/// found but not ticked (`Boolean(false)`) stays distinguishable from a
/// field whose label never appeared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl From<FieldValue> for serde_json::Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => serde_json::Value::String(s),
            FieldValue::Integer(v) => serde_json::Value::from(v),
            // Non-finite floats have no JSON form; they never come out of the
            // amount parser but map to null rather than panic.
            FieldValue::Float(v) => serde_json::Number::from_f64(v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Boolean(v) => serde_json::Value::Bool(v),
        }
    }
}
