//! Checkbox evidence rules for boolean fields.
//!
//! A ticked box reaches the corpus either glued to its label
//! ("Lift X Yes", "Flat X") or as a separate fragment next to the label
//! ("X", "Yes x"). Both forms are checked with ordered rules; the first rule
//! that matches decides the outcome.

use regex::Regex;

use super::normalize::glyph_alternation;
use crate::error::ConfigError;

/// One ordered evidence rule.
#[derive(Debug, Clone)]
struct EvidenceRule {
    name: &'static str,
    pattern: Regex,
    outcome: bool,
}

/// Evidence rules compiled for a set of mark glyphs.
#[derive(Debug, Clone)]
pub struct CheckboxRules {
    anchor_rules: Vec<EvidenceRule>,
    neighbour_rules: Vec<EvidenceRule>,
    glyphs: Vec<String>,
}

impl CheckboxRules {
    /// Compile the rules for `mark_glyphs` (each character is one glyph).
    pub fn new(mark_glyphs: &str) -> Result<Self, ConfigError> {
        let g = glyph_alternation(mark_glyphs);
        let rule = |name: &'static str, pattern: String, outcome: bool| {
            Regex::new(&pattern)
                .map(|pattern| EvidenceRule {
                    name,
                    pattern,
                    outcome,
                })
                .map_err(|source| ConfigError::Pattern {
                    key: "matching.mark_glyphs".to_string(),
                    source,
                })
        };

        let anchor_rules = vec![
            rule("mark_no", format!(r"{g}\s?(?i:no)\b"), false)?,
            rule("mark_answer", format!(r"{g} (?i:yes|no)\b"), true)?,
            rule("mark_at_end", format!(r"(?:^|\s){g}\s*$"), true)?,
            rule("yes_mark", format!(r"(?i:yes)\s?{g}"), true)?,
        ];
        let neighbour_rules = vec![
            rule("lone_mark", format!(r"^{g}$"), true)?,
            rule("lone_mark_no", format!(r"^{g}\s?(?i:no)$"), false)?,
        ];
        let glyphs = mark_glyphs
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_lowercase().to_string())
            .collect();

        Ok(Self {
            anchor_rules,
            neighbour_rules,
            glyphs,
        })
    }

    /// Evidence from the text that follows the keyword inside the anchor.
    pub fn anchor_evidence(&self, tail: &str) -> Option<bool> {
        first_match(&self.anchor_rules, tail)
    }

    /// Evidence from a fragment next to the anchor.
    pub fn neighbour_evidence(&self, text: &str) -> Option<bool> {
        let text = text.trim();
        if let Some(outcome) = first_match(&self.neighbour_rules, text) {
            return Some(outcome);
        }
        let lower = text.to_lowercase();
        (lower.contains("yes") && self.glyphs.iter().any(|g| lower.contains(g.as_str())))
            .then_some(true)
    }
}

fn first_match(rules: &[EvidenceRule], text: &str) -> Option<bool> {
    rules.iter().find(|r| r.pattern.is_match(text)).map(|r| {
        tracing::trace!(rule = r.name, text, "checkbox evidence");
        r.outcome
    })
}
