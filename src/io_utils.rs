//! Loading and emitting delimited tables.
//!
//! Inputs are read whole: the grouped aggregation needs every row resident.
//!
//! - **Encoding**: input decoding and output encoding via `encoding_rs`,
//!   defaulting to UTF-8. A leading byte-order mark is dropped on input.
//! - **Delimiter**: explicit, or sniffed from the first 64 KiB among
//!   `,` `;` tab and `|`.
//! - **Cells**: kept as text. Null markers become empty cells when requested.
//! - **Output**: UTF-8 output is prefixed with a byte-order mark so spreadsheet
//!   tools display accented characters correctly.
//! - **stdin**: the `-` path convention reads standard input.

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{table::Table, transform::text::is_na_token};

pub const DEFAULT_DELIMITER: u8 = b',';
pub const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
pub const SNIFF_SAMPLE_BYTES: usize = 64 * 1024;
const SNIFF_SAMPLE_LINES: usize = 20;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn read_input_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if is_dash(path) {
        std::io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .context("Reading standard input")?;
    } else {
        File::open(path)
            .with_context(|| format!("Opening input file {path:?}"))?
            .read_to_end(&mut bytes)
            .with_context(|| format!("Reading input file {path:?}"))?;
    }
    Ok(bytes)
}

/// Decodes input bytes, dropping any byte-order mark. Malformed sequences are
/// replaced rather than rejected.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(
            "Input contained sequences invalid for {}; replaced with U+FFFD",
            actual.name()
        );
    }
    text.into_owned()
}

/// Picks the candidate delimiter that splits the sampled lines most
/// consistently, falling back to a comma.
pub fn sniff_delimiter(text: &str) -> u8 {
    let mut end = text.len().min(SNIFF_SAMPLE_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let lines = text[..end]
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_SAMPLE_LINES)
        .collect::<Vec<_>>();
    if lines.is_empty() {
        return DEFAULT_DELIMITER;
    }

    let mut best: Option<(u8, bool, usize)> = None;
    for candidate in CANDIDATE_DELIMITERS {
        let counts = lines
            .iter()
            .map(|line| count_unquoted(line, candidate))
            .collect::<Vec<_>>();
        let total: usize = counts.iter().sum();
        if total == 0 {
            continue;
        }
        let consistent = counts.iter().all(|count| *count == counts[0]);
        let better = match best {
            None => true,
            Some((_, best_consistent, best_total)) => {
                (consistent, total) > (best_consistent, best_total)
            }
        };
        if better {
            best = Some((candidate, consistent, total));
        }
    }
    best.map_or(DEFAULT_DELIMITER, |(delimiter, _, _)| delimiter)
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Parses decoded text into a table. Rows may be ragged; the schema pass
/// squares them up.
pub fn parse_table(text: &str, delimiter: u8, has_headers: bool, na_values: bool) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let clean = |field: &str| {
        if na_values && is_na_token(field) {
            String::new()
        } else {
            field.to_string()
        }
    };

    let mut records = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 1))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        records.push(record);
    }

    let mut records = records.into_iter();
    let headers = if has_headers {
        records
            .next()
            .map(|record| record.iter().map(|field| field.trim().to_string()).collect())
    } else {
        None
    };
    let rows = records
        .map(|record| record.iter().map(clean).collect())
        .collect();
    Ok(Table::new(headers, rows))
}

/// Input options shared by every command that loads a table.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub has_headers: bool,
    pub encoding: &'static Encoding,
    pub na_values: bool,
}

/// Reads, decodes and parses an input file. Returns the delimiter that was used.
pub fn load_table(path: &Path, options: LoadOptions) -> Result<(Table, u8)> {
    let bytes = read_input_bytes(path)?;
    let text = decode_text(&bytes, options.encoding);
    let delimiter = match options.delimiter {
        Some(delimiter) => delimiter,
        None => {
            let sniffed = sniff_delimiter(&text);
            debug!(
                "Sniffed delimiter '{}' for {path:?}",
                crate::printable_delimiter(sniffed)
            );
            sniffed
        }
    };
    let table = parse_table(&text, delimiter, options.has_headers, options.na_values)
        .with_context(|| format!("Parsing {path:?}"))?;
    Ok((table, delimiter))
}

/// Output options for serialized tables.
#[derive(Debug, Clone, Copy)]
pub struct EmitOptions {
    pub delimiter: u8,
    pub include_headers: bool,
    pub encoding: &'static Encoding,
    pub bom: bool,
}

/// Serializes a table to bytes in memory so nothing touches disk until every
/// output of a run is ready.
pub fn serialize_table(table: &Table, options: EmitOptions) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .flexible(true)
        .from_writer(Vec::new());
    if options.include_headers
        && let Some(headers) = &table.headers
    {
        writer
            .write_record(headers)
            .context("Writing output headers")?;
    }
    for (idx, row) in table.rows.iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("Writing output row {}", idx + 1))?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| anyhow!("Flushing output buffer: {}", err.error()))?;
    let text = String::from_utf8(buffer).context("Output is not valid UTF-8")?;
    encode_text(&text, options.encoding, options.bom)
}

pub fn encode_text(text: &str, encoding: &'static Encoding, bom: bool) -> Result<Vec<u8>> {
    let (encoded, _, had_errors) = encoding.encode(text);
    if had_errors {
        return Err(anyhow!(
            "Failed to encode output using {}",
            encoding.name()
        ));
    }
    let mut bytes = Vec::with_capacity(encoded.len() + UTF8_BOM.len());
    if bom && encoding == UTF_8 {
        bytes.extend_from_slice(UTF8_BOM);
    }
    bytes.extend_from_slice(&encoded);
    Ok(bytes)
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
    file.write_all(bytes)
        .with_context(|| format!("Writing output file {path:?}"))?;
    file.flush()?;
    Ok(())
}

/// `<dir>/<stem><suffix>.csv` beside the input, or in the working directory
/// when reading stdin.
pub fn sibling_output(input: &Path, suffix: &str) -> PathBuf {
    let stem = if is_dash(input) {
        "stdin".to_string()
    } else {
        input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string())
    };
    let file_name = format!("{stem}{suffix}.csv");
    match input.parent() {
        Some(parent) if !is_dash(input) && !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Creating output directory {parent:?}"))?;
    }
    Ok(())
}
