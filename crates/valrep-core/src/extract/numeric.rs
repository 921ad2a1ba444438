//! Integer and amount parsing tolerant of OCR noise.

use super::patterns::{AMOUNT_RUN, INLINE_AMOUNT, NUMERIC_TOKEN, TRAILING_DIGITS};

/// Digit run closing `text`, e.g. `99` in "Remaining term of Lease 99".
pub fn trailing_integer(text: &str) -> Option<i64> {
    TRAILING_DIGITS
        .captures(text.trim_end())
        .and_then(|caps| caps[1].parse().ok())
}

/// First standalone number in `text`.
pub fn first_integer(text: &str) -> Option<i64> {
    NUMERIC_TOKEN
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

/// Truncate an implausible percentage to its leading digits.
///
/// OCR occasionally reads a stray character as an extra digit ("150" for
/// "15"); the leading digits are kept instead of rejecting the value.
pub fn correct_percent(value: i64, cap: i64, digits: usize) -> i64 {
    if value <= cap {
        return value;
    }
    let text = value.to_string();
    text.chars()
        .take(digits)
        .collect::<String>()
        .parse()
        .unwrap_or(value)
}

/// Whether `value` lies in the inclusive `[min, max]` year range.
pub fn is_plausible_year(value: i64, min: i64, max: i64) -> bool {
    (min..=max).contains(&value)
}

/// Amount embedded in a label line, optionally after `£` or `$`.
pub fn inline_amount(text: &str) -> Option<f64> {
    INLINE_AMOUNT
        .captures(text)
        .and_then(|caps| parse_plain_amount(&caps[1]))
}

/// Parse a standalone amount fragment such as `"£12,345.67"` or `"1,234"`.
///
/// Digit and separator runs are concatenated and thousands separators
/// removed. Returns `None` when nothing numeric remains.
pub fn parse_amount(text: &str) -> Option<f64> {
    let joined: String = AMOUNT_RUN.find_iter(text).map(|m| m.as_str()).collect();
    if joined.is_empty() {
        return None;
    }
    parse_plain_amount(&joined)
}

fn parse_plain_amount(s: &str) -> Option<f64> {
    let cleaned = s.replace(',', "");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Keep only ASCII digits.
pub fn digits_only(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit()).collect()
}
