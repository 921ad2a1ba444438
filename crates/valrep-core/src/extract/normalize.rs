//! Fragment text cleanup driven by an ordered rule table.
//!
//! A value fragment on a scanned form often still carries part of its label
//! ("Postcode: AB1 2CD"), a tick left over from an adjacent checkbox
//! ("Leasehold X"), or delimiter noise. Cleanup is expressed as data: each
//! [`NormalizationRule`] is a pattern and a replacement, applied in order and
//! followed by a whitespace trim. Rules can be tested one by one.

use lazy_static::lazy_static;
use regex::Regex;

use super::patterns::VALUE_DELIMITERS;
use crate::error::ConfigError;

/// A single pattern/replacement step.
#[derive(Debug, Clone)]
pub struct NormalizationRule {
    /// Short identifier used in logs and tests.
    pub name: &'static str,
    pub pattern: Regex,
    pub replacement: &'static str,
}

impl NormalizationRule {
    fn label(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            replacement,
        }
    }

    /// Rule removing a binding keyword plus any trailing `:`, `.` or spaces.
    pub fn keyword(keyword: &str) -> Option<Self> {
        let pattern = format!(r"(?i){}[:. ]*", regex::escape(keyword));
        Regex::new(&pattern).ok().map(|pattern| Self {
            name: "keyword",
            pattern,
            replacement: "",
        })
    }

    /// Apply the rule to `text` and trim surrounding whitespace.
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement)
            .trim()
            .to_string()
    }
}

/// Rules derived from one binding's keywords, compiled once and reused for
/// every fragment the binding inspects.
#[derive(Debug, Clone, Default)]
pub struct KeywordRules {
    strip: Vec<NormalizationRule>,
    find: Vec<Regex>,
}

impl KeywordRules {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let mut rules = Self::default();
        for keyword in keywords.iter().map(|k| k.as_ref()) {
            if keyword.trim().is_empty() {
                continue;
            }
            rules.strip.extend(NormalizationRule::keyword(keyword));
            rules
                .find
                .extend(Regex::new(&format!("(?i){}", regex::escape(keyword.trim()))).ok());
        }
        rules
    }

    /// Remove every keyword occurrence from `text`.
    pub fn strip(&self, text: &str) -> String {
        self.strip
            .iter()
            .fold(text.to_string(), |result, rule| rule.apply(&result))
    }

    /// For each keyword found in `text`, in keyword order, up to `window`
    /// characters following its first case-insensitive occurrence.
    pub fn tails<'a>(&'a self, text: &'a str, window: usize) -> impl Iterator<Item = String> + 'a {
        self.find.iter().filter_map(move |pattern| {
            let found = pattern.find(text)?;
            Some(text[found.end()..].chars().take(window).collect())
        })
    }
}

lazy_static! {
    /// Label remnants and form furniture, applied first.
    pub static ref LABEL_RULES: Vec<NormalizationRule> = vec![
        NormalizationRule::label("applicant_label", r"(?i)Applicant\(s\)\s*Surname\(s\)\s*&\s*Initials:?\.?", ""),
        NormalizationRule::label("application_number", r"(?i)Application Number:?\.?", ""),
        NormalizationRule::label("inspection_date", r"(?i)Date of Inspection:?\.?", ""),
        NormalizationRule::label("property_address", r"(?i)Property Address:?\.?", ""),
        NormalizationRule::label("postcode", r"(?i)Postcode:?\.?", ""),
        NormalizationRule::label("valuer_full_name", r"(?i)Full Name of Valuer:?\.?", ""),
        NormalizationRule::label("valuer_name", r"(?i)Name of Valuer:?\.?", ""),
        NormalizationRule::label("telephone", r"(?i)Telephone:?\.?", ""),
        NormalizationRule::label("email", r"(?i)E-mail:?\.?", ""),
        NormalizationRule::label("approximate_percent", r"(?i)approximate % of [a-z ]+", ""),
        NormalizationRule::label("conditional_details", r"(?i)If (?:Yes|No),? [a-z ]+ details:?", ""),
        NormalizationRule::label("on_behalf_prefix", r"(?i)For and (on behalf of)", "$1"),
        NormalizationRule::label("valuer_address", r"(?i)Address of Valuer:?\.?", ""),
        NormalizationRule::label("rics_number", r"(?i)RICS Number:?\.?", ""),
        NormalizationRule::label("fax", r"(?i)Fax:?\.?", ""),
        NormalizationRule::label("signature", r"(?i)Signature of Valuer", ""),
        NormalizationRule::label("electronic_signature", r"(?i)electronic signature", ""),
        NormalizationRule::label("trailing_colon", r":$", ""),
    ];
}

/// Builds the mark-glyph alternation, e.g. `(?:x|X|☑|v)`.
pub(crate) fn glyph_alternation(glyphs: &str) -> String {
    let parts: Vec<String> = glyphs
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    format!("(?:{})", parts.join("|"))
}

/// Text normalizer with label rules, per-call keyword rules and checkbox-mark
/// rules built for the configured glyph set.
#[derive(Debug, Clone)]
pub struct Normalizer {
    label_rules: Vec<NormalizationRule>,
    mark_rules: Vec<NormalizationRule>,
}

impl Normalizer {
    /// Create a normalizer for the given checkbox glyphs.
    pub fn new(mark_glyphs: &str) -> Result<Self, ConfigError> {
        let glyphs = glyph_alternation(mark_glyphs);
        let compile = |pattern: String| {
            Regex::new(&pattern).map_err(|source| ConfigError::Pattern {
                key: "matching.mark_glyphs".to_string(),
                source,
            })
        };

        // Case-sensitive on purpose: "X" after a capital ("SW1A 1AX") is data.
        let mark_rules = vec![
            NormalizationRule {
                name: "trailing_mark",
                pattern: compile(format!(r"(^|\s|[a-z]){}$", glyphs))?,
                replacement: "$1",
            },
            NormalizationRule {
                name: "glued_mark",
                pattern: compile(format!(r"([a-z]){}([A-Z])", glyphs))?,
                replacement: "$1$2",
            },
        ];

        Ok(Self {
            label_rules: LABEL_RULES.clone(),
            mark_rules,
        })
    }

    /// All fixed rules in application order (keyword rules excluded).
    pub fn rules(&self) -> impl Iterator<Item = &NormalizationRule> {
        self.label_rules.iter().chain(self.mark_rules.iter())
    }

    /// Clean `text`, removing label remnants, the binding's own keywords,
    /// trailing checkbox marks and stray delimiters.
    pub fn normalize(&self, text: &str, keywords: &KeywordRules) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let mut result = text.trim().to_string();
        for rule in &self.label_rules {
            result = rule.apply(&result);
        }
        result = keywords.strip(&result);
        for rule in &self.mark_rules {
            result = rule.apply(&result);
        }

        result.trim_matches(VALUE_DELIMITERS).trim().to_string()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        // The default glyph set is a fixed literal that always compiles.
        Self::new("xX☑v").unwrap()
    }
}
