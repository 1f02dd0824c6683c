use std::sync::LazyLock;

use regex::Regex;

pub const MIN_SEQUENCE_WIDTH: usize = 3;

static TRAILING_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)$").expect("hardcoded trailing digits regex is valid"));

/// Next number under `prefix`, continuing the sequence of `latest`.
///
/// Only the trailing digit run of `latest` matters; its own prefix is
/// ignored, so `INV-007` continues as `<prefix>008`. Without a usable
/// predecessor the sequence starts at 1.
pub fn next_document_number(prefix: &str, latest: Option<&str>) -> String {
    let next = latest
        .and_then(trailing_sequence)
        .and_then(|current| current.checked_add(1))
        .unwrap_or(1);
    format!("{prefix}{next:0width$}", width = MIN_SEQUENCE_WIDTH)
}

pub fn trailing_sequence(number: &str) -> Option<u64> {
    TRAILING_DIGITS_RE
        .captures(number.trim())
        .and_then(|capture| capture.get(1))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
}
