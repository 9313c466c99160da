//! Structured filter hints extracted from the raw question.

use regex::Regex;
use std::sync::OnceLock;

static YEAR_PATTERN: OnceLock<Regex> = OnceLock::new();

/// First plausible calendar-year token (`20xx`) in the question, if any.
///
/// Pure and infallible — no match is a normal outcome, not an error.
pub fn extract_year(question: &str) -> Option<i32> {
    let pattern = YEAR_PATTERN
        .get_or_init(|| Regex::new(r"\b(20\d\d)\b").expect("year pattern is valid"));
    pattern
        .find(question)
        .and_then(|m| m.as_str().parse().ok())
}
