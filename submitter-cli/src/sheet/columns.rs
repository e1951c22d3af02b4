//! Reserved control columns and column addressing helpers

/// Headers starting with this character are commented (bookkeeping) columns
pub const COMMENTED_PREFIX: char = '#';

/// Set to 1 to skip any READ/WRITE REST action for a row
pub const HEADER_COMMENTED_PROP_SKIP: &str = "#skip";
/// Action + HTTP status + JSON response of the last REST action
pub const HEADER_COMMENTED_PROP_RESPONSE: &str = "#response";
/// Time of the last REST action
pub const HEADER_COMMENTED_PROP_RESPONSE_TIME: &str = "#response_time";

/// Is this header a commented/control column? Matching is case-sensitive.
pub fn is_commented(header: &str) -> bool {
    header.trim_start().starts_with(COMMENTED_PREFIX)
}

/// Normalize header text for lookups: trimmed, inner whitespace collapsed, lowercase
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Convert a 1-based column index to A1 letters (1 -> "A", 27 -> "AA")
pub fn column_letters(col: usize) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Parse A1 column letters into a 1-based column index
pub fn parse_column_letters(letters: &str) -> Option<usize> {
    let letters = letters.trim();
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, c| {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}
