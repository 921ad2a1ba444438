//! Typed extractors.
//!
//! Every extractor follows the same decision order for each anchor: take the
//! value from the anchor's own text if it carries one, otherwise walk the
//! directional candidates nearest first, then move on to the next anchor.
//! The first accepted value wins.

use std::collections::HashSet;

use tracing::{debug, trace};

use super::anchor::{locate, MatchMode};
use super::checkbox::CheckboxRules;
use super::normalize::{KeywordRules, Normalizer};
use super::numeric;
use super::proximity::{nearby, search, Direction};
use super::FieldValue;
use crate::corpus::{Corpus, TextFragment};
use crate::error::ConfigError;
use crate::models::config::MatchingConfig;
use crate::schema::{ExtractorKind, FieldBinding};

/// Outcome of screening one piece of text as a field value.
#[derive(Debug, PartialEq)]
enum Screen {
    Accept(String),
    Reject,
    /// The text is a section heading: the search ran past the field.
    Stop,
}

/// Resolves field values from a corpus.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    config: MatchingConfig,
    normalizer: Normalizer,
    checkbox: CheckboxRules,
}

impl FieldExtractor {
    /// Build an extractor, validating the configuration and compiling the
    /// glyph-dependent rules.
    pub fn new(config: MatchingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let normalizer = Normalizer::new(&config.mark_glyphs)?;
        let checkbox = CheckboxRules::new(&config.mark_glyphs)?;
        Ok(Self {
            config,
            normalizer,
            checkbox,
        })
    }

    /// Resolve the value for one binding. `None` means the field was not
    /// found.
    pub fn extract(&self, corpus: &Corpus, binding: &FieldBinding) -> Option<FieldValue> {
        self.extract_with(corpus, binding, &KeywordRules::new(&binding.keywords))
    }

    /// Like [`extract`](Self::extract), with the binding's keyword rules
    /// compiled by the caller.
    pub fn extract_with(
        &self,
        corpus: &Corpus,
        binding: &FieldBinding,
        keywords: &KeywordRules,
    ) -> Option<FieldValue> {
        let value = match binding.kind {
            ExtractorKind::Text => self.extract_text(corpus, binding, keywords),
            ExtractorKind::Multiline => self.extract_multiline(corpus, binding, keywords),
            ExtractorKind::Integer => self.extract_int(corpus, binding),
            ExtractorKind::Boolean => self.extract_bool(corpus, binding, keywords),
            ExtractorKind::Currency => self.extract_currency(corpus, binding),
        };
        debug!(path = %binding.path, kind = ?binding.kind, value = ?value, "field resolved");
        value
    }

    /// Single-line text value beside or below the label.
    fn extract_text(
        &self,
        corpus: &Corpus,
        binding: &FieldBinding,
        keywords: &KeywordRules,
    ) -> Option<FieldValue> {
        let anchors = locate(corpus, &binding.keywords, binding.page, MatchMode::ExactThenSubstring);

        for anchor in anchors {
            let inline = self.screen(anchor.text(), binding, keywords, self.config.min_inline_len);
            if let Screen::Accept(value) = inline {
                return Some(FieldValue::Text(value));
            }

            for candidate in search(corpus, anchor, binding.direction, &self.config.text) {
                let text = candidate.fragment.text();
                match self.screen(text, binding, keywords, self.config.min_candidate_len) {
                    Screen::Accept(value) => return Some(FieldValue::Text(value)),
                    Screen::Reject => {
                        trace!(path = %binding.path, text, "candidate rejected");
                    }
                    Screen::Stop => {
                        trace!(path = %binding.path, text, "stop marker reached");
                        break;
                    }
                }
            }
        }
        None
    }

    /// Block of lines starting at the first anchor, joined with spaces.
    fn extract_multiline(
        &self,
        corpus: &Corpus,
        binding: &FieldBinding,
        keywords: &KeywordRules,
    ) -> Option<FieldValue> {
        let block = &self.config.block;
        let anchor = locate(corpus, &binding.keywords, binding.page, MatchMode::Substring)
            .into_iter()
            .next()?;
        let max_lines = binding.max_lines.unwrap_or(block.default_max_lines).max(1);

        let mut lines = Vec::new();
        let inline = self.normalizer.normalize(anchor.text(), keywords);
        if inline.chars().count() >= block.min_len {
            lines.push(inline);
        }

        // Corpus order is already (y1, x1) within a page.
        let members = corpus.on_page(anchor.page()).filter(|f| {
            *f != anchor
                && f.y1() >= anchor.y1() - block.lead
                && f.y1() - anchor.y2() < block.max_gap
                && (f.cx() - anchor.cx()).abs() < block.column_tolerance
        });

        for fragment in members {
            if lines.len() >= max_lines {
                break;
            }
            let text = self.normalizer.normalize(fragment.text(), keywords);
            if text.is_empty() || self.config.is_boilerplate(&text) {
                continue;
            }
            if self.config.is_stop_marker(&text) {
                trace!(path = %binding.path, text = %text, "block ends at stop marker");
                break;
            }
            lines.push(text);
        }

        let mut seen = HashSet::new();
        lines.retain(|line| seen.insert(line.clone()));
        let joined = lines.join(" ");

        (joined.chars().count() >= block.min_len).then_some(FieldValue::Text(joined))
    }

    /// Integer value: trailing digits of the label line, else the first
    /// number in a neighbouring fragment.
    fn extract_int(&self, corpus: &Corpus, binding: &FieldBinding) -> Option<FieldValue> {
        let anchors = locate(corpus, &binding.keywords, binding.page, MatchMode::ExactThenSubstring);

        for anchor in anchors {
            if let Some(value) =
                numeric::trailing_integer(anchor.text()).and_then(|v| self.accept_integer(v, binding))
            {
                return Some(FieldValue::Integer(value));
            }

            for candidate in search(corpus, anchor, binding.direction, &self.config.numeric) {
                let text = candidate.fragment.text();
                if self.config.is_stop_marker(text) {
                    break;
                }
                if self.config.is_boilerplate(text) {
                    trace!(path = %binding.path, text, "boilerplate skipped");
                    continue;
                }
                match numeric::first_integer(text).and_then(|v| self.accept_integer(v, binding)) {
                    Some(value) => return Some(FieldValue::Integer(value)),
                    None => trace!(path = %binding.path, text, "no usable integer"),
                }
            }
        }
        None
    }

    /// Checkbox state. `None` when no label was found, `false` when labels
    /// exist but none carries a mark.
    fn extract_bool(
        &self,
        corpus: &Corpus,
        binding: &FieldBinding,
        keywords: &KeywordRules,
    ) -> Option<FieldValue> {
        let anchors = locate(corpus, &binding.keywords, binding.page, MatchMode::Substring);
        if anchors.is_empty() {
            return None;
        }

        for anchor in anchors {
            if let Some(state) = self.anchor_mark(anchor, keywords) {
                return Some(FieldValue::Boolean(state));
            }
            for candidate in nearby(corpus, anchor, &self.config.checkbox) {
                if let Some(state) = self.checkbox.neighbour_evidence(candidate.fragment.text()) {
                    return Some(FieldValue::Boolean(state));
                }
            }
        }
        Some(FieldValue::Boolean(false))
    }

    /// Monetary amount on the label line, beside it, or just below it.
    fn extract_currency(&self, corpus: &Corpus, binding: &FieldBinding) -> Option<FieldValue> {
        let anchors = locate(corpus, &binding.keywords, binding.page, MatchMode::ExactThenSubstring);
        let directions: &[Direction] = match binding.direction {
            Direction::None => &[],
            _ => &[Direction::Right, Direction::Bottom],
        };

        for anchor in anchors {
            if let Some(amount) = numeric::inline_amount(anchor.text()) {
                return Some(FieldValue::Float(amount));
            }

            'directions: for &direction in directions {
                for candidate in search(corpus, anchor, direction, &self.config.currency) {
                    let text = candidate.fragment.text();
                    if self.config.is_stop_marker(text) {
                        break 'directions;
                    }
                    if self.config.is_boilerplate(text) {
                        trace!(path = %binding.path, text, "boilerplate skipped");
                        continue;
                    }
                    match numeric::parse_amount(text) {
                        Some(amount) => return Some(FieldValue::Float(amount)),
                        None => trace!(path = %binding.path, text, "not an amount"),
                    }
                }
            }
        }
        None
    }

    fn screen(
        &self,
        text: &str,
        binding: &FieldBinding,
        keywords: &KeywordRules,
        min_len: usize,
    ) -> Screen {
        let cleaned = self.normalizer.normalize(text, keywords);
        let len = cleaned.chars().count();
        if len < min_len {
            Screen::Reject
        } else if self.config.is_stop_marker(&cleaned) {
            Screen::Stop
        } else if self.config.is_boilerplate(&cleaned) {
            Screen::Reject
        } else if binding.max_len.is_some_and(|max| len > max) {
            Screen::Reject
        } else {
            Screen::Accept(cleaned)
        }
    }

    fn accept_integer(&self, value: i64, binding: &FieldBinding) -> Option<i64> {
        let value = if binding.is_percent {
            numeric::correct_percent(value, self.config.percent_cap, self.config.percent_digits)
        } else {
            value
        };
        if binding.is_year
            && !numeric::is_plausible_year(value, self.config.year_min, self.config.year_max)
        {
            trace!(path = %binding.path, value, "implausible year skipped");
            return None;
        }
        Some(value)
    }

    fn anchor_mark(&self, anchor: &TextFragment, keywords: &KeywordRules) -> Option<bool> {
        keywords
            .tails(anchor.text(), self.config.checkbox_window)
            .find_map(|tail| self.checkbox.anchor_evidence(&tail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::BoundingBox;

    fn frag(page: usize, text: &str, x1: f32, y1: f32, x2: f32, y2: f32) -> TextFragment {
        TextFragment::new(page, text, BoundingBox::new(x1, y1, x2, y2))
    }

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(MatchingConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = MatchingConfig::default();
        config.currency.right_max_gap = -1.0;
        assert!(FieldExtractor::new(config).is_err());
    }

    #[test]
    fn test_text_right_of_label() {
        let corpus = Corpus::new(vec![
            frag(0, "Tenure", 100.0, 500.0, 250.0, 540.0),
            frag(0, "Leasehold", 400.0, 502.0, 600.0, 542.0),
        ]);
        let value = extractor().extract(&corpus, &FieldBinding::text("tenure", &["Tenure"]));
        assert_eq!(value, Some(FieldValue::Text("Leasehold".into())));
    }

    #[test]
    fn test_text_inline_value() {
        let corpus = Corpus::new(vec![frag(0, "Postcode: AB1 2CD", 100.0, 500.0, 400.0, 540.0)]);
        let value = extractor().extract(&corpus, &FieldBinding::text("postCode", &["Postcode"]));
        assert_eq!(value, Some(FieldValue::Text("AB1 2CD".into())));
    }

    #[test]
    fn test_text_below_label() {
        let corpus = Corpus::new(vec![
            frag(0, "Applicant(s) Surname(s) & Initials:", 100.0, 300.0, 700.0, 340.0),
            frag(0, "Smith J", 120.0, 360.0, 300.0, 400.0),
        ]);
        let binding = FieldBinding::text("applicantName", &["Surname", "Initials"]).below();
        assert_eq!(
            extractor().extract(&corpus, &binding),
            Some(FieldValue::Text("Smith J".into()))
        );
    }

    #[test]
    fn test_text_skips_boilerplate_and_short_candidates() {
        let corpus = Corpus::new(vec![
            frag(0, "Tenure", 100.0, 500.0, 250.0, 540.0),
            frag(0, "X", 300.0, 500.0, 320.0, 540.0),
            frag(0, "please provide details", 400.0, 500.0, 700.0, 540.0),
            frag(0, "Freehold", 800.0, 500.0, 950.0, 540.0),
        ]);
        let value = extractor().extract(&corpus, &FieldBinding::text("tenure", &["Tenure"]));
        assert_eq!(value, Some(FieldValue::Text("Freehold".into())));
    }

    #[test]
    fn test_text_stop_marker_moves_to_next_anchor() {
        let corpus = Corpus::new(vec![
            frag(0, "Tenure", 100.0, 100.0, 250.0, 140.0),
            frag(0, "ACCOMMODATION", 300.0, 100.0, 600.0, 140.0),
            frag(0, "Freehold", 700.0, 100.0, 900.0, 140.0),
            frag(1, "Tenure", 100.0, 100.0, 250.0, 140.0),
            frag(1, "Leasehold", 300.0, 100.0, 500.0, 140.0),
        ]);
        let value = extractor().extract(&corpus, &FieldBinding::text("tenure", &["Tenure"]));
        assert_eq!(value, Some(FieldValue::Text("Leasehold".into())));
    }

    #[test]
    fn test_text_max_len() {
        let corpus = Corpus::new(vec![
            frag(0, "EPC Rating", 100.0, 100.0, 300.0, 140.0),
            frag(0, "see attached certificate", 350.0, 100.0, 700.0, 140.0),
            frag(0, "C", 800.0, 100.0, 820.0, 140.0),
            frag(0, "C7", 900.0, 100.0, 940.0, 140.0),
        ]);
        let binding = FieldBinding::text("epcRating", &["EPC Rating"]).max_len(2);
        assert_eq!(
            extractor().extract(&corpus, &binding),
            Some(FieldValue::Text("C7".into()))
        );
    }

    #[test]
    fn test_text_page_restriction() {
        let corpus = Corpus::new(vec![
            frag(1, "Date of Inspection: 01/02/2024", 100.0, 100.0, 600.0, 140.0),
        ]);
        let binding = FieldBinding::text("dateOfInspection", &["Date of Inspection"]).on_page(0);
        assert_eq!(extractor().extract(&corpus, &binding), None);
    }

    #[test]
    fn test_multiline_collects_block() {
        let corpus = Corpus::new(vec![
            frag(0, "Property Address", 100.0, 100.0, 400.0, 140.0),
            frag(0, "12 High Street", 450.0, 100.0, 700.0, 140.0),
            frag(0, "Anytown", 450.0, 150.0, 600.0, 190.0),
            frag(0, "Anytown", 450.0, 200.0, 600.0, 240.0),
            frag(0, "PROPERTY TYPE", 100.0, 260.0, 400.0, 300.0),
            frag(0, "Detached House", 100.0, 320.0, 400.0, 360.0),
        ]);
        let binding = FieldBinding::multiline("propertyAddress", &["Property Address"]);
        assert_eq!(
            extractor().extract(&corpus, &binding),
            Some(FieldValue::Text("12 High Street Anytown".into()))
        );
    }

    #[test]
    fn test_multiline_line_limit_and_min_length() {
        let corpus = Corpus::new(vec![
            frag(0, "GENERAL REMARKS", 100.0, 100.0, 400.0, 140.0),
            frag(0, "first", 100.0, 150.0, 300.0, 190.0),
            frag(0, "second", 100.0, 200.0, 300.0, 240.0),
            frag(0, "third", 100.0, 250.0, 300.0, 290.0),
        ]);
        let binding = FieldBinding::multiline("generalRemarks", &["GENERAL REMARKS"]).max_lines(2);
        assert_eq!(
            extractor().extract(&corpus, &binding),
            Some(FieldValue::Text("first second".into()))
        );

        let short = Corpus::new(vec![
            frag(0, "GENERAL REMARKS", 100.0, 100.0, 400.0, 140.0),
            frag(0, "ok", 100.0, 150.0, 300.0, 190.0),
        ]);
        assert_eq!(extractor().extract(&short, &binding), None);
    }

    #[test]
    fn test_int_inline_and_neighbour() {
        let corpus = Corpus::new(vec![
            frag(0, "Remaining term of Lease 99", 100.0, 100.0, 600.0, 140.0),
            frag(0, "Bedrooms", 100.0, 200.0, 300.0, 240.0),
            frag(0, "3", 400.0, 200.0, 420.0, 240.0),
        ]);
        let ex = extractor();
        assert_eq!(
            ex.extract(&corpus, &FieldBinding::integer("lease", &["Remaining term of Lease"])),
            Some(FieldValue::Integer(99))
        );
        assert_eq!(
            ex.extract(&corpus, &FieldBinding::integer("bedrooms", &["Bedrooms"])),
            Some(FieldValue::Integer(3))
        );
    }

    #[test]
    fn test_int_year_validation() {
        let corpus = Corpus::new(vec![
            frag(0, "Year property built", 100.0, 100.0, 500.0, 140.0),
            frag(0, "1756", 550.0, 100.0, 650.0, 140.0),
            frag(0, "1990", 700.0, 100.0, 800.0, 140.0),
        ]);
        let binding = FieldBinding::integer("yearBuilt", &["Year property built"]).year();
        assert_eq!(extractor().extract(&corpus, &binding), Some(FieldValue::Integer(1990)));
    }

    #[test]
    fn test_int_percent_correction() {
        let corpus = Corpus::new(vec![frag(0, "owner occupation 150", 100.0, 100.0, 500.0, 140.0)]);
        let binding = FieldBinding::integer("ownerOccupationPercentage", &["owner occupation"]).percent();
        assert_eq!(extractor().extract(&corpus, &binding), Some(FieldValue::Integer(15)));
    }

    #[test]
    fn test_bool_states() {
        let corpus = Corpus::new(vec![
            frag(0, "Lift X Yes", 100.0, 100.0, 400.0, 140.0),
            frag(0, "Is the property tenanted at present X No", 100.0, 300.0, 900.0, 340.0),
            frag(0, "Gardens", 100.0, 500.0, 300.0, 540.0),
        ]);
        let ex = extractor();
        assert_eq!(
            ex.extract(&corpus, &FieldBinding::boolean("lift", &["Lift"])),
            Some(FieldValue::Boolean(true))
        );
        assert_eq!(
            ex.extract(&corpus, &FieldBinding::boolean("tenanted", &["tenanted at present"])),
            Some(FieldValue::Boolean(false))
        );
        assert_eq!(
            ex.extract(&corpus, &FieldBinding::boolean("gardens", &["Gardens"])),
            Some(FieldValue::Boolean(false))
        );
        assert_eq!(ex.extract(&corpus, &FieldBinding::boolean("basement", &["Basement"])), None);
    }

    #[test]
    fn test_bool_neighbour_mark() {
        let corpus = Corpus::new(vec![
            frag(0, "Bungalow", 100.0, 100.0, 300.0, 140.0),
            frag(0, "X", 320.0, 100.0, 340.0, 140.0),
            frag(0, "Flat", 100.0, 400.0, 200.0, 440.0),
            frag(0, "X No", 220.0, 400.0, 300.0, 440.0),
        ]);
        let ex = extractor();
        assert_eq!(
            ex.extract(&corpus, &FieldBinding::boolean("bungalow", &["Bungalow"])),
            Some(FieldValue::Boolean(true))
        );
        assert_eq!(
            ex.extract(&corpus, &FieldBinding::boolean("flat", &["Flat"])),
            Some(FieldValue::Boolean(false))
        );
    }

    #[test]
    fn test_currency_inline_row_and_below() {
        let corpus = Corpus::new(vec![
            frag(0, "Ground Rent £250", 100.0, 100.0, 400.0, 140.0),
            frag(0, "Maintenance Charge", 100.0, 200.0, 400.0, 240.0),
            frag(0, "n/a", 450.0, 200.0, 500.0, 240.0),
            frag(0, "£1,234", 550.0, 200.0, 650.0, 240.0),
            frag(0, "Reinstatement Cost", 100.0, 400.0, 400.0, 440.0),
            frag(0, "£12,345.67", 120.0, 460.0, 300.0, 500.0),
        ]);
        let ex = extractor();
        assert_eq!(
            ex.extract(&corpus, &FieldBinding::currency("groundRent", &["Ground Rent"])),
            Some(FieldValue::Float(250.0))
        );
        assert_eq!(
            ex.extract(&corpus, &FieldBinding::currency("maintenance", &["Maintenance Charge"])),
            Some(FieldValue::Float(1234.0))
        );
        assert_eq!(
            ex.extract(&corpus, &FieldBinding::currency("reinstatement", &["Reinstatement Cost"])),
            Some(FieldValue::Float(12345.67))
        );
    }

    #[test]
    fn test_currency_without_amount() {
        let corpus = Corpus::new(vec![
            frag(0, "Road Charge", 100.0, 100.0, 300.0, 140.0),
            frag(0, "abc", 400.0, 100.0, 450.0, 140.0),
        ]);
        let binding = FieldBinding::currency("roadCharges", &["Road Charge", "Road Charge:"]);
        assert_eq!(extractor().extract(&corpus, &binding), None);
    }

    #[test]
    fn test_int_stop_marker_ends_search() {
        let corpus = Corpus::new(vec![
            frag(0, "Bedrooms", 100.0, 100.0, 300.0, 140.0),
            frag(0, "ACCOMMODATION", 350.0, 100.0, 600.0, 140.0),
            frag(0, "4", 700.0, 100.0, 720.0, 140.0),
        ]);
        let binding = FieldBinding::integer("bedrooms", &["Bedrooms"]);
        assert_eq!(extractor().extract(&corpus, &binding), None);
    }

    #[test]
    fn test_int_skips_boilerplate_candidate() {
        let corpus = Corpus::new(vec![
            frag(0, "Bedrooms", 100.0, 100.0, 300.0, 140.0),
            frag(0, "Gatehouse Bank 2", 350.0, 100.0, 600.0, 140.0),
            frag(0, "4", 700.0, 100.0, 720.0, 140.0),
        ]);
        let binding = FieldBinding::integer("bedrooms", &["Bedrooms"]);
        assert_eq!(extractor().extract(&corpus, &binding), Some(FieldValue::Integer(4)));
    }

    #[test]
    fn test_currency_stop_marker_ends_both_directions() {
        let corpus = Corpus::new(vec![
            frag(0, "Ground Rent", 100.0, 100.0, 300.0, 140.0),
            frag(0, "SERVICES", 350.0, 100.0, 550.0, 140.0),
            frag(0, "£250", 120.0, 160.0, 250.0, 200.0),
        ]);
        let binding = FieldBinding::currency("groundRent", &["Ground Rent"]);
        assert_eq!(extractor().extract(&corpus, &binding), None);
    }

    #[test]
    fn test_currency_skips_boilerplate_candidate() {
        let corpus = Corpus::new(vec![
            frag(0, "Ground Rent", 100.0, 100.0, 300.0, 140.0),
            frag(0, "Gatehouse Bank 1", 350.0, 100.0, 600.0, 140.0),
            frag(0, "£250", 700.0, 100.0, 800.0, 140.0),
        ]);
        let binding = FieldBinding::currency("groundRent", &["Ground Rent"]);
        assert_eq!(extractor().extract(&corpus, &binding), Some(FieldValue::Float(250.0)));
    }

    #[test]
    fn test_currency_inline_only() {
        let corpus = Corpus::new(vec![
            frag(0, "Service Charge", 100.0, 100.0, 300.0, 140.0),
            frag(0, "£900", 350.0, 100.0, 450.0, 140.0),
            frag(0, "Ground Rent £5", 100.0, 300.0, 400.0, 340.0),
        ]);
        let ex = extractor();
        let service = FieldBinding::currency("serviceCharge", &["Service Charge"]).inline_only();
        assert_eq!(ex.extract(&corpus, &service), None);

        let rent = FieldBinding::currency("groundRent", &["Ground Rent"]).inline_only();
        assert_eq!(ex.extract(&corpus, &rent), Some(FieldValue::Float(5.0)));
    }

    #[test]
    fn test_extract_with_precompiled_keywords() {
        let corpus = Corpus::new(vec![frag(0, "Lift X Yes", 100.0, 100.0, 400.0, 140.0)]);
        let binding = FieldBinding::boolean("lift", &["Lift"]);
        let keywords = KeywordRules::new(&binding.keywords);
        assert_eq!(
            extractor().extract_with(&corpus, &binding, &keywords),
            Some(FieldValue::Boolean(true))
        );
    }
}
