//! Anchor lookup: fragments whose text names a field.

use crate::corpus::{reading_order, Corpus, TextFragment};

use super::patterns::LABEL_DELIMITERS;

/// How keyword phrases are matched against fragment text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Whole-line matches first; substring matches only when none exist.
    ExactThenSubstring,
    /// Substring matches only.
    Substring,
}

/// Find the fragments matching any of `keywords`, in (page, y1) order.
///
/// Matching is case-insensitive. `page` restricts the search to one page.
pub fn locate<'a, S: AsRef<str>>(
    corpus: &'a Corpus,
    keywords: &[S],
    page: Option<usize>,
    mode: MatchMode,
) -> Vec<&'a TextFragment> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Vec::new();
    }

    let in_scope = |f: &&TextFragment| page.is_none_or(|p| f.page() == p);

    let mut anchors: Vec<&TextFragment> = Vec::new();
    if mode == MatchMode::ExactThenSubstring {
        anchors = corpus
            .iter()
            .filter(in_scope)
            .filter(|f| is_exact_match(f.text(), &keywords))
            .collect();
    }
    if anchors.is_empty() {
        anchors = corpus
            .iter()
            .filter(in_scope)
            .filter(|f| {
                let text = f.text().to_lowercase();
                keywords.iter().any(|k| text.contains(k.as_str()))
            })
            .collect();
    }

    anchors.sort_by(|a, b| reading_order(a, b));
    anchors
}

/// `text` equals a keyword outright, or once trailing delimiters are dropped.
fn is_exact_match(text: &str, keywords: &[String]) -> bool {
    let lower = text.trim().to_lowercase();
    let stripped = lower.trim_end_matches(LABEL_DELIMITERS).trim_end();
    keywords.iter().any(|k| lower == *k || stripped == k)
}
