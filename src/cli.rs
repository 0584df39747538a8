use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::dates::DateOrder;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Derive arrival ranges and summaries from shipment CSV exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Derive prioritized values, min/max ranges and buckets, then write the full file and summary
    Process(ProcessArgs),
    /// Run the pipeline and print the first derived rows and the summary as text tables
    Preview(PreviewArgs),
    /// Print the default pipeline configuration as YAML
    Config,
}

/// Options shared by every command that loads an export.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV file ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|'); sniffed when omitted
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Treat the first row as data instead of a header row
    #[arg(long = "no-headers")]
    pub no_headers: bool,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding the default pipeline configuration
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// How slash-separated dates are read (overrides the configuration)
    #[arg(long = "date-order", value_enum)]
    pub date_order: Option<DateOrder>,
    /// Keep null markers such as 'NaN' or 'NULL' as literal text
    #[arg(long = "keep-na")]
    pub keep_na: bool,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Full output file (defaults to '<input>_completo.csv')
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Summary output file (defaults to '<input>_resumen.csv')
    #[arg(short = 's', long = "summary")]
    pub summary: Option<PathBuf>,
    /// Delimiter for the full output (defaults to the input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for output files (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Do not prefix UTF-8 output with a byte-order mark
    #[arg(long = "no-bom")]
    pub no_bom: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Number of derived rows to display
    #[arg(long, default_value_t = 20)]
    pub rows: usize,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" | "\\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
