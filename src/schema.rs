//! Column-count normalization.
//!
//! Exports arrive with anything from the bare source columns to the full
//! derived layout. [`ensure_min_columns`] pads a table to the required width so
//! that every derived column has a fixed position to land in. When the table
//! has a header row, the synthesized trailing columns take their names from the
//! tail of a canonical list, so a file missing only its last `k` columns gets
//! exactly the last `k` canonical names.

use std::collections::HashSet;

use log::debug;

use crate::table::Table;

/// Names for the derived trailing columns J..O, in positional order.
pub const CANONICAL_TRAILING_NAMES: &[&str] = &[
    "Valid BoL",
    "Min",
    "Max",
    "Diferencia",
    "Valor priorizado",
    "Rango",
];

/// Pads `table` to at least `required` columns and makes every row the same
/// width. Never fails; callers decide whether the original width was enough.
pub fn ensure_min_columns(table: &Table, required: usize, canonical: Option<&[&str]>) -> Table {
    let original_width = table.width();
    let width = original_width.max(required);

    let headers = table.headers.as_ref().map(|headers| {
        let mut headers = headers.clone();
        let mut taken: HashSet<String> = headers.iter().cloned().collect();
        let missing = width - headers.len();
        let names = synthesized_names(headers.len(), missing, canonical.unwrap_or(&[]));
        for name in names {
            let unique = disambiguate(&name, &taken);
            taken.insert(unique.clone());
            headers.push(unique);
        }
        headers
    });

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            row.resize(width, String::new());
            row
        })
        .collect();

    if width > original_width {
        debug!(
            "Padded table from {original_width} to {width} column(s) (required {required})"
        );
    }
    Table { headers, rows }
}

/// Names for `missing` columns appended after position `start`. The canonical
/// suffix covers the final positions; anything before it is generic.
fn synthesized_names(start: usize, missing: usize, canonical: &[&str]) -> Vec<String> {
    let from_canonical = missing.min(canonical.len());
    let generic = missing - from_canonical;
    let mut names = Vec::with_capacity(missing);
    for offset in 0..generic {
        names.push(format!("__extra_{}__", start + offset + 1));
    }
    names.extend(
        canonical[canonical.len() - from_canonical..]
            .iter()
            .map(|name| name.to_string()),
    );
    names
}

fn disambiguate(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_string();
    }
    (2..)
        .map(|counter| format!("{name}_{counter}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headed(names: &[&str], rows: usize) -> Table {
        Table::new(
            Some(names.iter().map(|s| s.to_string()).collect()),
            (0..rows)
                .map(|_| names.iter().map(|_| "v".to_string()).collect())
                .collect(),
        )
    }

    fn letters(count: usize) -> Vec<String> {
        (0..count)
            .map(|idx| char::from(b'A' + idx as u8).to_string())
            .collect()
    }

    #[test]
    fn missing_trailing_columns_take_canonical_suffix() {
        let names = letters(12);
        let names = names.iter().map(String::as_str).collect::<Vec<_>>();
        let table = headed(&names, 2);
        let padded = ensure_min_columns(&table, 15, Some(CANONICAL_TRAILING_NAMES));
        let headers = padded.headers.unwrap();
        assert_eq!(headers.len(), 15);
        assert_eq!(&headers[12..], &["Diferencia", "Valor priorizado", "Rango"]);
        assert!(padded.rows.iter().all(|row| row.len() == 15));
        assert_eq!(padded.rows[0][14], "");
    }

    #[test]
    fn generic_names_precede_canonical_when_too_many_are_missing() {
        let table = headed(&["A", "B"], 1);
        let padded = ensure_min_columns(&table, 10, Some(CANONICAL_TRAILING_NAMES));
        let headers = padded.headers.unwrap();
        assert_eq!(headers[2], "__extra_3__");
        assert_eq!(headers[3], "__extra_4__");
        assert_eq!(headers[4], "Valid BoL");
        assert_eq!(headers[9], "Rango");
    }

    #[test]
    fn collisions_get_counter_suffix() {
        let table = headed(&["Rango", "Max"], 1);
        let padded = ensure_min_columns(&table, 4, Some(CANONICAL_TRAILING_NAMES));
        let headers = padded.headers.unwrap();
        assert_eq!(headers, vec!["Rango", "Max", "Valor priorizado", "Rango_2"]);
    }

    #[test]
    fn headerless_tables_only_gain_cells() {
        let table = Table::new(None, vec![vec!["a".into()], vec!["b".into(), "c".into()]]);
        let padded = ensure_min_columns(&table, 3, Some(CANONICAL_TRAILING_NAMES));
        assert!(padded.headers.is_none());
        assert_eq!(padded.rows[0], vec!["a", "", ""]);
        assert_eq!(padded.rows[1], vec!["b", "c", ""]);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let table = headed(&["A", "B", "C"], 3);
        let once = ensure_min_columns(&table, 6, Some(CANONICAL_TRAILING_NAMES));
        let twice = ensure_min_columns(&once, 6, Some(CANONICAL_TRAILING_NAMES));
        assert_eq!(once, twice);
    }

    #[test]
    fn wide_tables_are_untouched() {
        let table = headed(&["A", "B", "C"], 2);
        assert_eq!(ensure_min_columns(&table, 2, None), table);
    }
}
