//! Common regex patterns for field value parsing.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Digit run closing a label line, e.g. "Remaining term of Lease 99"
    pub static ref TRAILING_DIGITS: Regex = Regex::new(
        r"(\d+)$"
    ).unwrap();

    // First standalone number in a fragment
    pub static ref NUMERIC_TOKEN: Regex = Regex::new(
        r"\b\d+\b"
    ).unwrap();

    // Amount embedded in a label line, optionally after a currency symbol
    pub static ref INLINE_AMOUNT: Regex = Regex::new(
        r"[£$]?\s?(\d[\d,.]*)"
    ).unwrap();

    // Digit/separator runs of a standalone amount fragment
    pub static ref AMOUNT_RUN: Regex = Regex::new(
        r"\d[\d.,]*"
    ).unwrap();
}

/// Characters dropped from the end of a fragment before an exact label match.
pub const LABEL_DELIMITERS: &[char] = &[':', '.', ';', '-', '?'];

/// Characters trimmed from both ends of a normalized value.
pub const VALUE_DELIMITERS: &[char] = &[':', ' ', '.', '-', '(', ')', '&', '/'];
