//! Field bindings: how one schema path is found on the page.

use serde::{Deserialize, Serialize};

use crate::extract::Direction;

/// Which typed extractor resolves a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    Text,
    Multiline,
    Integer,
    Boolean,
    Currency,
}

/// Static mapping from a schema path to its label keywords and search
/// options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBinding {
    /// Dotted path into the record, e.g. `propertyType.tenure`.
    pub path: String,

    /// Label phrases; any one matching makes a fragment an anchor.
    pub keywords: Vec<String>,

    pub kind: ExtractorKind,

    #[serde(default)]
    pub direction: Direction,

    /// Reject integers outside the plausible year range.
    #[serde(default)]
    pub is_year: bool,

    /// Truncate integers above the percent cap.
    #[serde(default)]
    pub is_percent: bool,

    /// Only look for anchors on this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,

    /// Longest acceptable text value, in characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,

    /// Line bound for multiline blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<usize>,

    /// Keep only the digits of the resolved text.
    #[serde(default)]
    pub digits_only: bool,
}

impl FieldBinding {
    pub fn new(path: &str, keywords: &[&str], kind: ExtractorKind) -> Self {
        Self {
            path: path.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            kind,
            direction: Direction::Right,
            is_year: false,
            is_percent: false,
            page: None,
            max_len: None,
            max_lines: None,
            digits_only: false,
        }
    }

    pub fn text(path: &str, keywords: &[&str]) -> Self {
        Self::new(path, keywords, ExtractorKind::Text)
    }

    pub fn multiline(path: &str, keywords: &[&str]) -> Self {
        Self::new(path, keywords, ExtractorKind::Multiline).below()
    }

    pub fn integer(path: &str, keywords: &[&str]) -> Self {
        Self::new(path, keywords, ExtractorKind::Integer)
    }

    pub fn boolean(path: &str, keywords: &[&str]) -> Self {
        Self::new(path, keywords, ExtractorKind::Boolean)
    }

    pub fn currency(path: &str, keywords: &[&str]) -> Self {
        Self::new(path, keywords, ExtractorKind::Currency)
    }

    /// Search below the label instead of to its right.
    pub fn below(mut self) -> Self {
        self.direction = Direction::Bottom;
        self
    }

    /// Only accept a value written inside the label fragment.
    pub fn inline_only(mut self) -> Self {
        self.direction = Direction::None;
        self
    }

    pub fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn year(mut self) -> Self {
        self.is_year = true;
        self
    }

    pub fn percent(mut self) -> Self {
        self.is_percent = true;
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = Some(max_lines);
        self
    }

    pub fn digits_only(mut self) -> Self {
        self.digits_only = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let binding = FieldBinding::integer("propertyType.conversionYear", &["year of conversion"])
            .year()
            .on_page(1);
        assert_eq!(binding.kind, ExtractorKind::Integer);
        assert_eq!(binding.direction, Direction::Right);
        assert!(binding.is_year);
        assert!(!binding.is_percent);
        assert_eq!(binding.page, Some(1));
    }

    #[test]
    fn test_multiline_searches_below() {
        let binding = FieldBinding::multiline("generalRemarks", &["GENERAL REMARKS"]).max_lines(10);
        assert_eq!(binding.direction, Direction::Bottom);
        assert_eq!(binding.max_lines, Some(10));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let binding: FieldBinding = serde_json::from_str(
            r#"{"path": "propertyType.tenure", "keywords": ["Tenure"], "kind": "text"}"#,
        )
        .unwrap();
        assert_eq!(binding, FieldBinding::text("propertyType.tenure", &["Tenure"]));
    }

    #[test]
    fn test_serialize_skips_unset_options() {
        let json = serde_json::to_value(FieldBinding::currency("x", &["Ground Rent"])).unwrap();
        assert_eq!(json["kind"], "currency");
        assert_eq!(json["direction"], "right");
        assert!(json.get("page").is_none());
    }
}
