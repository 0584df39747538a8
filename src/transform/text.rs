//! Blank detection and text normalization shared by every derivation.
//!
//! A cell is *blank* when it is missing or empty after trimming. Null markers
//! produced by spreadsheet exports (`NaN`, `NULL`, ...) are folded into empty
//! cells at load time, so nothing past the loader needs to know about them.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Literal written wherever no valid value is available.
pub const SENTINEL: &str = "No Valido";

const SENTINEL_FOLDED: &str = "no valido";

/// Tokens treated as null when loading a table. Matching is exact after
/// trimming, the same list spreadsheet-oriented dataframe loaders use.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn whitespace_runs() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static whitespace pattern"))
}

pub fn is_blank(cell: Option<&str>) -> bool {
    cell.is_none_or(is_blank_str)
}

pub fn is_blank_str(cell: &str) -> bool {
    cell.trim().is_empty()
}

/// Returns `true` when the token is one of the loader-level null markers.
pub fn is_na_token(cell: &str) -> bool {
    let trimmed = cell.trim();
    NA_TOKENS.contains(&trimmed)
}

/// Folds a value for robust equality: trimmed, lowercase, single spaces, no
/// diacritics. Blanks fold to the empty string.
pub fn normalize_for_comparison(cell: Option<&str>) -> String {
    let Some(raw) = cell.filter(|value| !is_blank_str(value)) else {
        return String::new();
    };
    let lowered = raw.trim().to_lowercase();
    let collapsed = whitespace_runs().replace_all(&lowered, " ");
    collapsed
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect()
}

/// Folds a shipment type for token comparison: trimmed, uppercase, spaces
/// replaced by underscores.
pub fn normalize_discriminator(cell: Option<&str>) -> String {
    let Some(raw) = cell.filter(|value| !is_blank_str(value)) else {
        return String::new();
    };
    raw.trim().to_uppercase().replace(' ', "_")
}

pub fn is_sentinel(cell: Option<&str>) -> bool {
    normalize_for_comparison(cell) == SENTINEL_FOLDED
}

/// Trimmed value, or `None` when the cell is blank or carries the sentinel.
pub fn clean_value(cell: Option<&str>) -> Option<&str> {
    let value = cell?.trim();
    if value.is_empty() || is_sentinel(Some(value)) {
        None
    } else {
        Some(value)
    }
}
