use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use shipment_report::{
    Table, run_pipeline,
    config::PipelineConfig,
    dates::DateOrder,
    interval::{RangeBucket, classify_bucket, classify_hours},
    range::{AggregateColumns, aggregate_extrema},
    schema::{CANONICAL_TRAILING_NAMES, ensure_min_columns},
};

const KEYS: [&str; 3] = ["BOL-A", "BOL-B", "BOL-C"];

fn container_row(key: &str, hours: i64) -> Vec<String> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let stamp = (base + Duration::hours(hours))
        .format("%Y-%m-%d %H:%M")
        .to_string();
    vec![
        "C".to_string(),
        "CONTAINER".to_string(),
        key.to_string(),
        stamp,
    ]
}

const COLUMNS: AggregateColumns = AggregateColumns {
    discriminator: 1,
    key: 2,
    dates: 3,
};

fn container_rows() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec((0usize..KEYS.len(), 0i64..500), 1..40).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(key, hours)| container_row(KEYS[key], hours))
            .collect()
    })
}

proptest! {
    #[test]
    fn aggregation_ignores_row_order(
        (rows, shuffled) in container_rows()
            .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle()))
    ) {
        let config = PipelineConfig::default();
        let original = aggregate_extrema(
            &Table::new(None, rows),
            COLUMNS,
            &config.container,
            DateOrder::Auto,
        );
        let reordered = aggregate_extrema(
            &Table::new(None, shuffled),
            COLUMNS,
            &config.container,
            DateOrder::Auto,
        );
        prop_assert_eq!(original, reordered);
    }

    #[test]
    fn classify_bucket_is_total(value in ".*") {
        let bucket = classify_bucket(Some(&value));
        prop_assert!(RangeBucket::ALL.contains(&bucket));
    }

    #[test]
    fn classify_hours_follows_thresholds(hours in -1000.0f64..1000.0) {
        let bucket = classify_hours(hours);
        let expected = if hours.abs() <= 1e-9 {
            RangeBucket::Zero
        } else if hours < 0.0 {
            RangeBucket::Invalid
        } else if hours <= 24.0 {
            RangeBucket::UpTo24
        } else {
            RangeBucket::Over24
        };
        prop_assert_eq!(bucket, expected);
    }

    #[test]
    fn schema_normalization_is_idempotent(width in 0usize..20, required in 0usize..20) {
        let headers = (0..width).map(|idx| format!("col{idx}")).collect::<Vec<_>>();
        let rows = vec![vec!["x".to_string(); width]];
        let table = Table::new(Some(headers), rows);
        let once = ensure_min_columns(&table, required, Some(CANONICAL_TRAILING_NAMES));
        let twice = ensure_min_columns(&once, required, Some(CANONICAL_TRAILING_NAMES));
        prop_assert_eq!(once.width(), width.max(required));
        prop_assert_eq!(&once.headers, &twice.headers);
        prop_assert_eq!(&once.rows, &twice.rows);
    }
}

fn shipment(rows: &[[&str; 8]]) -> Table {
    Table::new(
        None,
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
    )
}

#[test]
fn summary_counts_each_key_once() {
    let table = shipment(&[
        ["S1", "BILL_OF_LADING", "B1", "", "", "", "", ""],
        ["S1b", "BILL_OF_LADING", "B1", "", "", "", "", ""],
        ["C1", "CONTAINER", "B1", "", "", "", "2024-01-01 00:00", ""],
        ["C2", "CONTAINER", "B1", "", "", "", "2024-01-01 05:30", ""],
        ["S2", "BILL_OF_LADING", "B2", "", "", "", "", ""],
        ["S3", "BILL_OF_LADING", "", "", "", "", "", ""],
    ]);
    let report = run_pipeline(table, &PipelineConfig::default()).expect("pipeline");
    assert_eq!(report.table.cell(0, 12), Some("5.50"));
    assert_eq!(report.table.cell(5, 9), Some("No Valido"));

    let summary = report
        .summary
        .iter()
        .map(|row| (row.indicator.as_str(), row.value))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            ("BoL únicos sin blancos", 2),
            ("BoL con valor válido", 1),
            ("BoL sin valor válido", 1),
            ("BoL con rango 0", 0),
            ("BoL con rango 0 - 24 Hrs", 1),
            ("BoL con rango + de 24 Hrs", 0),
        ]
    );
}

#[test]
fn sentinel_and_unparseable_dates_never_fail_the_run() {
    let table = shipment(&[
        ["S1", "BILL_OF_LADING", "B1", "", "", "", "", ""],
        ["C1", "CONTAINER", "B1", "", "", "", "not a date", "   "],
        ["C3", "CONTAINER", "B1", "", "", "", "", "No Valido"],
        ["C2", "CONTAINER", "B1", "", "", "", "31/31/2024", ""],
    ]);
    let report = run_pipeline(table, &PipelineConfig::default()).expect("pipeline");
    assert_eq!(report.table.cell(1, 13), Some("not a date"));
    assert_eq!(report.table.cell(2, 13), Some("No Valido"));
    assert_eq!(report.table.cell(3, 13), Some("31/31/2024"));
    assert_eq!(report.table.cell(0, 10), Some("No Valido"));
    assert_eq!(report.table.cell(0, 14), Some("No Valido"));
    assert_eq!(report.summary[2].value, 1);
}

#[test]
fn container_rows_never_include_header_rows() {
    let table = shipment(&[
        ["S1", "BILL_OF_LADING", "B1", "", "", "", "2020-01-01 00:00", ""],
        ["C1", "CONTAINER", "B1", "", "", "", "2024-01-01 00:00", ""],
        ["C2", "CONTAINER", "B1", "", "", "", "2024-01-02 00:00", ""],
    ]);
    let report = run_pipeline(table, &PipelineConfig::default()).expect("pipeline");
    let group = report.extrema.get("B1").expect("group");
    assert_eq!(group.min, "2024-01-01 00:00");
    assert_eq!(group.max, "2024-01-02 00:00");
    assert_eq!(report.table.cell(0, 12), Some("24.00"));
    assert_eq!(report.table.cell(0, 14), Some("0 - 24 Hrs"));
}

#[test]
fn day_first_extremes_are_never_inverted() {
    let table = shipment(&[
        ["S1", "BILL_OF_LADING", "K", "", "", "", "", ""],
        ["C1", "CONTAINER", "K", "", "", "", "", "12/04/2024 00:00"],
        ["C2", "CONTAINER", "K", "", "", "", "", "05/06/2024 00:00"],
        ["C3", "CONTAINER", "X", "", "", "", "", "25/04/2024 00:00"],
    ]);
    let report = run_pipeline(table, &PipelineConfig::default()).expect("pipeline");
    let group = report.extrema.get("K").expect("group");
    assert_eq!(group.min, "12/04/2024 00:00");
    assert_eq!(group.max, "05/06/2024 00:00");
    assert_eq!(report.table.cell(0, 12), Some("1296.00"));
    assert_eq!(report.table.cell(0, 14), Some("+ de 24 Hrs"));
    let values = report.summary.iter().map(|row| row.value).collect::<Vec<_>>();
    assert_eq!(values, vec![1, 1, 0, 0, 0, 1]);
}

#[test]
fn two_digit_years_stay_in_their_century() {
    let table = shipment(&[
        ["S1", "BILL_OF_LADING", "B1", "", "", "", "", ""],
        ["C1", "CONTAINER", "B1", "", "", "", "1/2/24 10:00", ""],
        ["C2", "CONTAINER", "B1", "", "", "", "", "01/03/2024 10:00"],
    ]);
    let report = run_pipeline(table, &PipelineConfig::default()).expect("pipeline");
    let group = report.extrema.get("B1").expect("group");
    assert_eq!(group.min, "1/2/24 10:00");
    assert_eq!(group.max, "01/03/2024 10:00");
    assert_eq!(report.table.cell(0, 12), Some("24.00"));
    assert_eq!(report.table.cell(0, 14), Some("0 - 24 Hrs"));
}
