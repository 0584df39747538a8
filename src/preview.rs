use std::borrow::Cow;
use std::fmt::Write as _;

use anyhow::Result;
use log::info;

use crate::{cli::PreviewArgs, process, summary::SUMMARY_HEADERS};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let (report, _) = process::load_and_run(&args.input)?;
    let headers = report.table.display_headers();
    let rows = report
        .table
        .rows
        .iter()
        .take(args.rows)
        .cloned()
        .collect::<Vec<_>>();
    print!("{}", render_table(&headers, &rows));
    println!();

    let summary_headers = SUMMARY_HEADERS.map(String::from);
    let summary_rows = report
        .summary
        .iter()
        .map(|row| row.to_record())
        .collect::<Vec<_>>();
    print!("{}", render_table(&summary_headers, &summary_rows));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        rows.len(),
        report.table.row_count(),
        args.input.input
    );
    Ok(())
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
