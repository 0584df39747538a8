//! Per-key minimum and maximum timestamps.
//!
//! Container rows are grouped by bill of lading. For each group the earliest
//! and latest prioritized timestamps are found, and the *original* strings of
//! the rows holding them are kept so the output preserves the export's date
//! format. The resulting map backfills every row sharing the key, including
//! the bill-of-lading header rows that carry no timestamps themselves.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use log::debug;

use crate::{
    config::TypeMatcher,
    dates::{DateOrder, ResolvedOrder, parse_timestamp, resolve_order},
    table::Table,
    transform::text::{SENTINEL, clean_value, is_blank_str},
};

/// Representative strings for one group's earliest and latest timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extremum {
    pub min: String,
    pub max: String,
}

impl Extremum {
    pub fn sentinel() -> Self {
        Self {
            min: SENTINEL.to_string(),
            max: SENTINEL.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.min == SENTINEL && self.max == SENTINEL
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupExtrema {
    groups: BTreeMap<String, Extremum>,
    order: ResolvedOrder,
}

impl GroupExtrema {
    /// Looks up a raw key cell. Blank keys and unknown keys get the sentinel
    /// pair.
    pub fn lookup(&self, key: Option<&str>) -> Extremum {
        key.filter(|key| !is_blank_str(key))
            .and_then(|key| self.groups.get(key.trim()))
            .cloned()
            .unwrap_or_else(Extremum::sentinel)
    }

    pub fn get(&self, key: &str) -> Option<&Extremum> {
        self.groups.get(key)
    }

    /// The date order the extremes were picked under. Anything comparing the
    /// representative strings afterwards must read them the same way.
    pub fn order(&self) -> ResolvedOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups that produced a real min/max.
    pub fn valid_count(&self) -> usize {
        self.groups.values().filter(|group| !group.is_sentinel()).count()
    }
}

/// Column positions an aggregation reads from.
#[derive(Debug, Clone, Copy)]
pub struct AggregateColumns {
    pub discriminator: usize,
    pub key: usize,
    pub dates: usize,
}

struct Tracked<'a> {
    min: Option<(NaiveDateTime, &'a str)>,
    max: Option<(NaiveDateTime, &'a str)>,
}

/// Builds the per-key extremum map from rows selected by `matcher`.
///
/// The date order is settled once over the whole candidate column. Ties on the
/// timestamp keep the first row in table order.
pub fn aggregate_extrema(
    table: &Table,
    columns: AggregateColumns,
    matcher: &TypeMatcher,
    order: DateOrder,
) -> GroupExtrema {
    let candidates = table
        .rows
        .iter()
        .filter(|row| matcher.matches(cell(row, columns.discriminator)))
        .filter_map(|row| {
            let key = cell(row, columns.key).filter(|key| !is_blank_str(key))?;
            Some((key.trim(), cell(row, columns.dates)))
        })
        .collect::<Vec<_>>();

    let resolved = resolve_order(
        order,
        candidates
            .iter()
            .filter_map(|(_, value)| clean_value(*value)),
    );

    let mut tracked: BTreeMap<&str, Tracked<'_>> = BTreeMap::new();
    for &(key, value) in &candidates {
        let entry = tracked.entry(key).or_insert(Tracked {
            min: None,
            max: None,
        });
        let Some(raw) = clean_value(value) else {
            continue;
        };
        let Some(stamp) = parse_timestamp(raw, resolved) else {
            continue;
        };
        if entry.min.is_none_or(|(current, _)| stamp < current) {
            entry.min = Some((stamp, raw));
        }
        if entry.max.is_none_or(|(current, _)| stamp > current) {
            entry.max = Some((stamp, raw));
        }
    }

    let groups = tracked
        .into_iter()
        .map(|(key, group)| {
            let extremum = match (group.min, group.max) {
                (Some((_, min)), Some((_, max))) => Extremum {
                    min: min.to_string(),
                    max: max.to_string(),
                },
                _ => Extremum::sentinel(),
            };
            (key.to_string(), extremum)
        })
        .collect::<BTreeMap<_, _>>();

    debug!(
        "Aggregated {} candidate row(s) into {} group(s) using {resolved:?}",
        candidates.len(),
        groups.len()
    );
    GroupExtrema {
        groups,
        order: resolved,
    }
}

fn cell(row: &[String], column: usize) -> Option<&str> {
    row.get(column).map(String::as_str)
}
