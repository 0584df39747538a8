//! Indicator/value summary over bill-of-lading header rows.
//!
//! Header rows are deduplicated by identity before anything is counted, so a
//! bill of lading listed twice contributes once. Which row represents the
//! identity is decided by [`Collapse`].

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    config::TypeMatcher,
    interval::{RangeBucket, classify_bucket},
    table::Table,
    transform::text::is_blank_str,
};

pub const LABEL_TOTAL: &str = "BoL únicos sin blancos";
pub const LABEL_VALID: &str = "BoL con valor válido";
pub const LABEL_INVALID: &str = "BoL sin valor válido";
pub const LABEL_ZERO: &str = "BoL con rango 0";
pub const LABEL_UP_TO_24: &str = "BoL con rango 0 - 24 Hrs";
pub const LABEL_OVER_24: &str = "BoL con rango + de 24 Hrs";

pub const SUMMARY_HEADERS: [&str; 2] = ["indicador", "valor"];

/// How duplicate header rows for one identity are reduced to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collapse {
    /// The first row in table order.
    First,
    /// The row with the most severe bucket.
    #[default]
    MostSevere,
}

/// Where a row's bucket comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketSource {
    /// A column holding bucket labels.
    Label(usize),
    /// A column holding hour differences, classified on the fly.
    Hours(usize),
}

impl BucketSource {
    fn bucket(self, row: &[String]) -> RangeBucket {
        match self {
            BucketSource::Label(column) => row
                .get(column)
                .map_or(RangeBucket::Invalid, |label| RangeBucket::from_label(label)),
            BucketSource::Hours(column) => classify_bucket(row.get(column).map(String::as_str)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SummaryColumns {
    pub discriminator: usize,
    pub identity: usize,
    pub bucket: BucketSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub indicator: String,
    pub value: usize,
}

impl SummaryRow {
    fn new(indicator: &str, value: usize) -> Self {
        Self {
            indicator: indicator.to_string(),
            value,
        }
    }

    pub fn to_record(&self) -> Vec<String> {
        vec![self.indicator.clone(), self.value.to_string()]
    }
}

pub fn build_summary(
    table: &Table,
    columns: SummaryColumns,
    header: &TypeMatcher,
    collapse: Collapse,
) -> Vec<SummaryRow> {
    let mut representatives: HashMap<&str, RangeBucket> = HashMap::new();
    for row in &table.rows {
        if !header.matches(row.get(columns.discriminator).map(String::as_str)) {
            continue;
        }
        let Some(identity) = row
            .get(columns.identity)
            .map(|value| value.trim())
            .filter(|value| !is_blank_str(value))
        else {
            continue;
        };
        let bucket = columns.bucket.bucket(row);
        representatives
            .entry(identity)
            .and_modify(|current| {
                if collapse == Collapse::MostSevere && bucket > *current {
                    *current = bucket;
                }
            })
            .or_insert(bucket);
    }

    let counts = representatives.values().counts();
    let count = |bucket: RangeBucket| counts.get(&bucket).copied().unwrap_or(0);
    let total = representatives.len();
    let invalid = count(RangeBucket::Invalid);

    vec![
        SummaryRow::new(LABEL_TOTAL, total),
        SummaryRow::new(LABEL_VALID, total - invalid),
        SummaryRow::new(LABEL_INVALID, invalid),
        SummaryRow::new(LABEL_ZERO, count(RangeBucket::Zero)),
        SummaryRow::new(LABEL_UP_TO_24, count(RangeBucket::UpTo24)),
        SummaryRow::new(LABEL_OVER_24, count(RangeBucket::Over24)),
    ]
}

/// The summary as a two-column table ready for output.
pub fn summary_table(rows: &[SummaryRow]) -> Table {
    Table::new(
        Some(SUMMARY_HEADERS.iter().map(|s| s.to_string()).collect()),
        rows.iter().map(SummaryRow::to_record).collect(),
    )
}
