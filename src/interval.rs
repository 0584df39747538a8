//! Elapsed hours between two timestamps and the range bucket they fall in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    dates::{DateOrder, parse_timestamp, resolve_order},
    transform::text::{SENTINEL, clean_value},
};

const EPSILON: f64 = 1e-9;

/// How an hour difference is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HoursFormat {
    /// Whole values as integers (`60`), otherwise two decimals (`1.50`).
    Compact,
    /// Always two decimals (`60.00`).
    #[default]
    Fixed,
}

/// Classification of an hour difference.
///
/// Variants are declared from least to most severe, so `Ord` ranks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RangeBucket {
    Invalid,
    Zero,
    UpTo24,
    Over24,
}

impl RangeBucket {
    pub const ALL: [RangeBucket; 4] = [
        RangeBucket::Invalid,
        RangeBucket::Zero,
        RangeBucket::UpTo24,
        RangeBucket::Over24,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RangeBucket::Invalid => SENTINEL,
            RangeBucket::Zero => "0",
            RangeBucket::UpTo24 => "0 - 24 Hrs",
            RangeBucket::Over24 => "+ de 24 Hrs",
        }
    }

    /// Reads a label back; anything unrecognised is `Invalid`.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        RangeBucket::ALL
            .into_iter()
            .find(|bucket| bucket.label().eq_ignore_ascii_case(trimmed))
            .unwrap_or(RangeBucket::Invalid)
    }
}

impl fmt::Display for RangeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hours from `min` to `max`, compact formatting.
pub fn hours_between(min: Option<&str>, max: Option<&str>, order: DateOrder) -> String {
    hours_between_with(min, max, order, HoursFormat::Compact)
}

/// Hours from `min` to `max`. Both values share one date order; with
/// [`DateOrder::Auto`] it is settled from the pair itself. Blank, sentinel or
/// unparseable input yields the sentinel. Negative results are kept.
pub fn hours_between_with(
    min: Option<&str>,
    max: Option<&str>,
    order: DateOrder,
    format: HoursFormat,
) -> String {
    let (Some(min), Some(max)) = (clean_value(min), clean_value(max)) else {
        return SENTINEL.to_string();
    };
    let resolved = resolve_order(order, [min, max]);
    let (Some(start), Some(end)) = (
        parse_timestamp(min, resolved),
        parse_timestamp(max, resolved),
    ) else {
        return SENTINEL.to_string();
    };
    let seconds = (end - start).num_milliseconds() as f64 / 1000.0;
    format_hours(seconds / 3600.0, format)
}

pub fn format_hours(hours: f64, format: HoursFormat) -> String {
    let nearest = hours.round();
    match format {
        HoursFormat::Compact if (hours - nearest).abs() <= EPSILON => {
            // Avoid rendering "-0".
            format!("{:.0}", nearest + 0.0)
        }
        _ => format!("{hours:.2}"),
    }
}

/// Buckets an hour-difference cell. Total: every input maps to a bucket.
pub fn classify_bucket(value: Option<&str>) -> RangeBucket {
    let Some(raw) = clean_value(value) else {
        return RangeBucket::Invalid;
    };
    let Ok(hours) = raw.replace(',', ".").parse::<f64>() else {
        return RangeBucket::Invalid;
    };
    classify_hours(hours)
}

pub fn classify_hours(hours: f64) -> RangeBucket {
    if hours.is_nan() {
        RangeBucket::Invalid
    } else if hours.abs() <= EPSILON {
        RangeBucket::Zero
    } else if hours < 0.0 {
        RangeBucket::Invalid
    } else if hours <= 24.0 {
        RangeBucket::UpTo24
    } else {
        RangeBucket::Over24
    }
}
