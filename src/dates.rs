//! Timestamp parsing with an explicit month/day order.
//!
//! Exports mix ISO timestamps with slash-separated dates whose field order is
//! ambiguous. [`DateOrder::Auto`] settles the order once per column by parsing
//! every candidate under both conventions and keeping whichever parses more
//! values, month-first on ties. This is a heuristic: a column made only of
//! values like `01/02/2024` parses equally under both orders and is read
//! month-first.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

/// How slash/dash separated dates are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum DateOrder {
    MonthFirst,
    DayFirst,
    #[default]
    Auto,
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DateOrder::MonthFirst => "month-first",
            DateOrder::DayFirst => "day-first",
            DateOrder::Auto => "auto",
        };
        f.write_str(label)
    }
}

/// A concrete order, once `Auto` has been settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolvedOrder {
    #[default]
    MonthFirst,
    DayFirst,
}

impl From<ResolvedOrder> for DateOrder {
    fn from(order: ResolvedOrder) -> Self {
        match order {
            ResolvedOrder::MonthFirst => DateOrder::MonthFirst,
            ResolvedOrder::DayFirst => DateOrder::DayFirst,
        }
    }
}

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
];

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const MONTH_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m-%d-%Y %H:%M:%S%.f",
    "%m-%d-%Y %H:%M",
];

const MONTH_FIRST_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y"];

const DAY_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %I:%M:%S %p",
    "%d/%m/%Y %I:%M %p",
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
];

const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

const MONTH_FIRST_SHORT_DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%y %H:%M:%S%.f",
    "%m/%d/%y %H:%M",
    "%m/%d/%y %I:%M:%S %p",
    "%m/%d/%y %I:%M %p",
    "%m-%d-%y %H:%M:%S%.f",
    "%m-%d-%y %H:%M",
];

const MONTH_FIRST_SHORT_DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m-%d-%y"];

const DAY_FIRST_SHORT_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%y %H:%M:%S%.f",
    "%d/%m/%y %H:%M",
    "%d/%m/%y %I:%M:%S %p",
    "%d/%m/%y %I:%M %p",
    "%d-%m-%y %H:%M:%S%.f",
    "%d-%m-%y %H:%M",
    "%d.%m.%y %H:%M:%S%.f",
    "%d.%m.%y %H:%M",
];

const DAY_FIRST_SHORT_DATE_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];

/// Where the year sits in the date part of a value, and how wide it is.
///
/// chrono's `%Y` also accepts one or two digits, so the format family is picked
/// from the shape first: `1/2/24` must never parse as year 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YearShape {
    Leading,
    TrailingFull,
    TrailingShort,
    Unknown,
}

fn year_shape(value: &str) -> YearShape {
    let date = value.split([' ', 'T']).next().unwrap_or(value);
    let bytes = date.as_bytes();
    if bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && !bytes[4].is_ascii_digit() {
        return YearShape::Leading;
    }
    let year = date.rsplit(['/', '-', '.']).next().unwrap_or_default();
    if year.len() == date.len() || !year.bytes().all(|byte| byte.is_ascii_digit()) {
        return YearShape::Unknown;
    }
    match year.len() {
        4 => YearShape::TrailingFull,
        2 => YearShape::TrailingShort,
        _ => YearShape::Unknown,
    }
}

/// Parses a trimmed timestamp under the given order. Returns `None` instead of
/// an error: unparseable dates are simply "no valid value" downstream.
pub fn parse_timestamp(value: &str, order: ResolvedOrder) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    // Offsets are folded into UTC so differences across offsets stay exact.
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    let (datetime_formats, date_formats) = match (year_shape(value), order) {
        (YearShape::Leading, _) => (ISO_DATETIME_FORMATS, ISO_DATE_FORMATS),
        (YearShape::TrailingFull, ResolvedOrder::MonthFirst) => {
            (MONTH_FIRST_DATETIME_FORMATS, MONTH_FIRST_DATE_FORMATS)
        }
        (YearShape::TrailingFull, ResolvedOrder::DayFirst) => {
            (DAY_FIRST_DATETIME_FORMATS, DAY_FIRST_DATE_FORMATS)
        }
        (YearShape::TrailingShort, ResolvedOrder::MonthFirst) => {
            (MONTH_FIRST_SHORT_DATETIME_FORMATS, MONTH_FIRST_SHORT_DATE_FORMATS)
        }
        (YearShape::TrailingShort, ResolvedOrder::DayFirst) => {
            (DAY_FIRST_SHORT_DATETIME_FORMATS, DAY_FIRST_SHORT_DATE_FORMATS)
        }
        (YearShape::Unknown, _) => return None,
    };
    for fmt in datetime_formats {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(parsed);
        }
    }
    for fmt in date_formats {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Some(parsed.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Settles `order` against a whole column of candidate values.
pub fn resolve_order<'a, I>(order: DateOrder, values: I) -> ResolvedOrder
where
    I: IntoIterator<Item = &'a str>,
{
    match order {
        DateOrder::MonthFirst => ResolvedOrder::MonthFirst,
        DateOrder::DayFirst => ResolvedOrder::DayFirst,
        DateOrder::Auto => {
            let mut month_first = 0usize;
            let mut day_first = 0usize;
            for value in values {
                if parse_timestamp(value, ResolvedOrder::MonthFirst).is_some() {
                    month_first += 1;
                }
                if parse_timestamp(value, ResolvedOrder::DayFirst).is_some() {
                    day_first += 1;
                }
            }
            let resolved = if day_first > month_first {
                ResolvedOrder::DayFirst
            } else {
                ResolvedOrder::MonthFirst
            };
            debug!(
                "Date order resolved to {resolved:?} ({month_first} month-first vs {day_first} day-first parses)"
            );
            resolved
        }
    }
}
