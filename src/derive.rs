//! Row-level derived fields.

use crate::transform::text::{SENTINEL, is_blank};

/// Actual timestamp if present, else the estimated one, else the sentinel.
pub fn compute_prioritized(actual: Option<&str>, estimated: Option<&str>) -> String {
    match (actual, estimated) {
        (Some(actual), _) if !is_blank(Some(actual)) => actual.trim().to_string(),
        (_, Some(estimated)) if !is_blank(Some(estimated)) => estimated.trim().to_string(),
        _ => SENTINEL.to_string(),
    }
}

/// The trimmed bill-of-lading key, or the sentinel when the key is blank.
pub fn valid_bol(key: Option<&str>) -> String {
    match key {
        Some(key) if !is_blank(Some(key)) => key.trim().to_string(),
        _ => SENTINEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actual_wins_then_estimated_then_sentinel() {
        assert_eq!(compute_prioritized(Some(""), Some("")), "No Valido");
        assert_eq!(
            compute_prioritized(Some(""), Some("2024-01-01")),
            "2024-01-01"
        );
        assert_eq!(
            compute_prioritized(Some("2024-01-02"), Some("2024-01-01")),
            "2024-01-02"
        );
        assert_eq!(compute_prioritized(None, None), "No Valido");
    }

    #[test]
    fn whitespace_only_falls_through() {
        assert_eq!(
            compute_prioritized(Some("   "), Some(" 2024-01-01 ")),
            "2024-01-01"
        );
        assert_eq!(compute_prioritized(Some("\t"), Some(" ")), "No Valido");
    }

    #[test]
    fn valid_bol_trims_or_marks_invalid() {
        assert_eq!(valid_bol(Some(" BOL1 ")), "BOL1");
        assert_eq!(valid_bol(Some("  ")), "No Valido");
        assert_eq!(valid_bol(None), "No Valido");
    }
}
