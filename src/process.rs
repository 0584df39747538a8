//! The report pipeline.
//!
//! [`run_pipeline`] is a pure function from a loaded table and a configuration
//! to the derived table, the per-key extremum map and the summary. The
//! `process` command wraps it with loading and emitting; both output files are
//! serialized before either is written, so a failed run leaves nothing behind.

use std::collections::HashSet;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    cli::{InputArgs, ProcessArgs},
    config::{BackfillScope, PipelineConfig},
    dates::{DateOrder, resolve_order},
    derive::{compute_prioritized, valid_bol},
    error::{ReportError, ReportResult},
    interval::{classify_bucket, hours_between_with},
    io_utils::{self, EmitOptions, LoadOptions},
    range::{AggregateColumns, Extremum, GroupExtrema, aggregate_extrema},
    schema::{CANONICAL_TRAILING_NAMES, ensure_min_columns},
    summary::{BucketSource, SummaryColumns, SummaryRow, build_summary, summary_table},
    table::Table,
    transform::text::{SENTINEL, clean_value, is_blank_str},
};

pub const FULL_SUFFIX: &str = "_completo";
pub const SUMMARY_SUFFIX: &str = "_resumen";
const SUMMARY_DELIMITER: u8 = b',';

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct Report {
    pub table: Table,
    pub extrema: GroupExtrema,
    pub summary: Vec<SummaryRow>,
}

/// Source column positions after names have been resolved.
#[derive(Debug, Clone, Copy)]
struct Resolved {
    shipment_type: usize,
    bill_of_lading: usize,
    estimated: usize,
    actual: usize,
    identity: usize,
}

impl Resolved {
    fn new(config: &PipelineConfig, table: &Table) -> ReportResult<Self> {
        let layout = &config.columns;
        let resolved = Self {
            shipment_type: layout.shipment_type.resolve(table)?,
            bill_of_lading: layout.bill_of_lading.resolve(table)?,
            estimated: layout.estimated.resolve(table)?,
            actual: layout.actual.resolve(table)?,
            identity: layout.identity().resolve(table)?,
        };
        // The shipment id is only checked for presence.
        let shipment_id = layout.shipment_id.resolve(table)?;
        let required = [
            shipment_id,
            resolved.shipment_type,
            resolved.bill_of_lading,
            resolved.estimated,
            resolved.actual,
            resolved.identity,
        ]
        .into_iter()
        .max()
        .map_or(0, |position| position + 1);
        let found = table.width();
        if found < required {
            return Err(ReportError::MissingColumns { required, found });
        }
        for (label, column) in layout.source_columns() {
            debug!("Source column {label} -> {column}");
        }
        Ok(resolved)
    }
}

pub fn run_pipeline(table: Table, config: &PipelineConfig) -> ReportResult<Report> {
    config.validate()?;
    if table.rows.is_empty() {
        return Err(ReportError::EmptyInput);
    }
    let source = Resolved::new(config, &table)?;
    let layout = &config.columns;

    let canonical = config.canonical_names.then_some(CANONICAL_TRAILING_NAMES);
    let mut table = ensure_min_columns(&table, config.required_columns, canonical);

    for row in 0..table.row_count() {
        let prioritized = compute_prioritized(
            table.cell(row, source.actual),
            table.cell(row, source.estimated),
        );
        table.set_cell(row, layout.prioritized, prioritized);
        if let Some(column) = layout.valid_bol {
            let marker = valid_bol(table.cell(row, source.bill_of_lading));
            table.set_cell(row, column, marker);
        }
    }

    let extrema = aggregate_extrema(
        &table,
        AggregateColumns {
            discriminator: source.shipment_type,
            key: source.bill_of_lading,
            dates: layout.prioritized,
        },
        &config.container,
        config.date_order,
    );
    info!(
        "Aggregated {} bill(s) of lading, {} with a valid range",
        extrema.len(),
        extrema.valid_count()
    );

    backfill(&mut table, &extrema, source, config);
    let order = interval_order(&table, &extrema, config);
    write_intervals(&mut table, config, order);

    let bucket = match layout.range {
        Some(column) => BucketSource::Label(column),
        None => BucketSource::Hours(layout.difference),
    };
    let summary = build_summary(
        &table,
        SummaryColumns {
            discriminator: source.shipment_type,
            identity: source.identity,
            bucket,
        },
        &config.header,
        config.summary_collapse,
    );

    Ok(Report {
        table,
        extrema,
        summary,
    })
}

fn backfill(table: &mut Table, extrema: &GroupExtrema, source: Resolved, config: &PipelineConfig) {
    let layout = &config.columns;
    let single_key = config.own_dates_when_single_key && distinct_keys(table, source.bill_of_lading) == 1;
    if single_key {
        debug!("Single bill of lading in file; rows without a group range use their own dates");
    }

    for row in 0..table.row_count() {
        let in_scope = match config.backfill {
            BackfillScope::AllRows => true,
            BackfillScope::HeaderRows => config.header.matches(table.cell(row, source.shipment_type)),
        };
        let mut extremum = if in_scope {
            extrema.lookup(table.cell(row, source.bill_of_lading))
        } else {
            Extremum::sentinel()
        };
        if in_scope && single_key && extremum.is_sentinel() {
            extremum = Extremum {
                min: own_value(table.cell(row, source.estimated)),
                max: own_value(table.cell(row, source.actual)),
            };
        }
        table.set_cell(row, layout.min, extremum.min);
        table.set_cell(row, layout.max, extremum.max);
    }
}

fn own_value(cell: Option<&str>) -> String {
    clean_value(cell).unwrap_or(SENTINEL).to_string()
}

fn distinct_keys(table: &Table, column: usize) -> usize {
    table
        .rows
        .iter()
        .filter_map(|row| row.get(column))
        .map(|key| key.trim())
        .filter(|key| !is_blank_str(key))
        .collect::<HashSet<_>>()
        .len()
}

/// The order Min/Max are read back under. Extremes picked by the aggregation
/// keep its order; otherwise (only own-date fallbacks) it is settled once over
/// the whole Min and Max columns.
fn interval_order(table: &Table, extrema: &GroupExtrema, config: &PipelineConfig) -> DateOrder {
    if extrema.valid_count() > 0 {
        return extrema.order().into();
    }
    let layout = &config.columns;
    let values = (0..table.row_count())
        .flat_map(|row| [table.cell(row, layout.min), table.cell(row, layout.max)])
        .filter_map(clean_value);
    resolve_order(config.date_order, values).into()
}

fn write_intervals(table: &mut Table, config: &PipelineConfig, order: DateOrder) {
    let layout = &config.columns;
    for row in 0..table.row_count() {
        let hours = hours_between_with(
            table.cell(row, layout.min),
            table.cell(row, layout.max),
            order,
            config.hours_format,
        );
        let bucket = classify_bucket(Some(&hours));
        table.set_cell(row, layout.difference, hours);
        if let Some(column) = layout.range {
            table.set_cell(row, column, bucket.label());
        }
    }
}

/// Settles the effective configuration from a config file and CLI overrides.
pub fn load_config(args: &InputArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(order) = args.date_order {
        config.date_order = order;
    }
    if args.keep_na {
        config.na_values = false;
    }
    Ok(config)
}

/// Loads the input named by `args` and runs the pipeline over it.
pub fn load_and_run(args: &InputArgs) -> Result<(Report, u8)> {
    let config = load_config(args)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let (table, delimiter) = io_utils::load_table(
        &args.input,
        LoadOptions {
            delimiter: args.delimiter,
            has_headers: !args.no_headers,
            encoding,
            na_values: config.na_values,
        },
    )?;
    info!(
        "Loaded {} row(s) x {} column(s) from {:?} (delimiter '{}', date order {})",
        table.row_count(),
        table.width(),
        args.input,
        crate::printable_delimiter(delimiter),
        config.date_order
    );
    let report = run_pipeline(table, &config)
        .with_context(|| format!("Processing {:?}", args.input))?;
    Ok((report, delimiter))
}

pub fn execute(args: &ProcessArgs) -> Result<()> {
    let (report, input_delimiter) = load_and_run(&args.input)?;
    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let full_path = args
        .output
        .clone()
        .unwrap_or_else(|| io_utils::sibling_output(&args.input.input, FULL_SUFFIX));
    let summary_path = args
        .summary
        .clone()
        .unwrap_or_else(|| io_utils::sibling_output(&args.input.input, SUMMARY_SUFFIX));

    let full_bytes = io_utils::serialize_table(
        &report.table,
        EmitOptions {
            delimiter: args.output_delimiter.unwrap_or(input_delimiter),
            include_headers: report.table.has_headers(),
            encoding,
            bom: !args.no_bom,
        },
    )
    .context("Serializing full file")?;
    let summary_bytes = io_utils::serialize_table(
        &summary_table(&report.summary),
        EmitOptions {
            delimiter: SUMMARY_DELIMITER,
            include_headers: true,
            encoding,
            bom: !args.no_bom,
        },
    )
    .context("Serializing summary")?;

    io_utils::ensure_parent_dir(&full_path)?;
    io_utils::ensure_parent_dir(&summary_path)?;
    io_utils::write_bytes(&full_path, &full_bytes)?;
    io_utils::write_bytes(&summary_path, &summary_bytes)?;

    for row in &report.summary {
        info!("{}: {}", row.indicator, row.value);
    }
    info!(
        "Wrote {} row(s) to {:?} and summary to {:?}",
        report.table.row_count(),
        full_path,
        summary_path
    );
    Ok(())
}
