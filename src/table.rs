//! In-memory table of text cells.
//!
//! Every cell is kept as the string that was loaded; nothing is coerced at load
//! time. Columns are addressed by 0-based position or, when the table has a
//! header row, by name through [`ColumnRef`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ReportError, ReportResult},
    transform::text::normalize_for_comparison,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Option<Vec<String>>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn has_headers(&self) -> bool {
        self.headers.is_some()
    }

    /// Widest of the header row and every data row.
    pub fn width(&self) -> usize {
        let header_width = self.headers.as_ref().map_or(0, Vec::len);
        self.rows
            .iter()
            .map(Vec::len)
            .fold(header_width, usize::max)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }

    /// Writes `value` into a cell, growing the row if it is short.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) {
        let Some(cells) = self.rows.get_mut(row) else {
            return;
        };
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value.into();
    }

    /// Header names, or `field_<n>` placeholders for a headerless table.
    pub fn display_headers(&self) -> Vec<String> {
        match &self.headers {
            Some(headers) => headers.clone(),
            None => (0..self.width()).map(|idx| format!("field_{idx}")).collect(),
        }
    }

    /// Resolves a header name, matching accent- and case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let headers = self.headers.as_ref()?;
        let wanted = normalize_for_comparison(Some(name));
        headers
            .iter()
            .position(|header| header == name)
            .or_else(|| {
                headers
                    .iter()
                    .position(|header| normalize_for_comparison(Some(header)) == wanted)
            })
    }
}

/// A column addressed by position or by header name.
///
/// In YAML an integer is a position and a string is a name:
/// `estimated: 6` or `estimated: "Estimated arrival"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Position(usize),
    Name(String),
}

impl ColumnRef {
    pub fn resolve(&self, table: &Table) -> ReportResult<usize> {
        match self {
            ColumnRef::Position(idx) => Ok(*idx),
            ColumnRef::Name(name) => {
                if !table.has_headers() {
                    return Err(ReportError::NamedColumnWithoutHeaders { name: name.clone() });
                }
                table
                    .column_index(name)
                    .ok_or_else(|| ReportError::UnknownColumn(name.clone()))
            }
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Position(idx) => write!(f, "#{idx}"),
            ColumnRef::Name(name) => write!(f, "'{name}'"),
        }
    }
}

impl From<usize> for ColumnRef {
    fn from(value: usize) -> Self {
        ColumnRef::Position(value)
    }
}

impl From<&str> for ColumnRef {
    fn from(value: &str) -> Self {
        ColumnRef::Name(value.to_string())
    }
}
