use thiserror::Error;

/// Failures that stop a report run before any output is produced.
///
/// Unparseable dates are deliberately absent: they degrade to the sentinel
/// value instead of failing the run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Input has {found} column(s) but at least {required} are required")]
    MissingColumns { required: usize, found: usize },
    #[error("Column '{0}' was not found in the input headers")]
    UnknownColumn(String),
    #[error("Column '{name}' cannot be resolved by name because the input has no header row")]
    NamedColumnWithoutHeaders { name: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Input contains no rows")]
    EmptyInput,
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
