use moneta_core::ValidationError;
use thiserror::Error;

/// A single row failed institution-specific parsing.
#[derive(Error, Debug)]
pub enum RowError {
    #[error("Invalid date: '{0}'")]
    InvalidDate(String),
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Error, Debug)]
pub enum IngestError {
    /// The header row never matched the institution's expected column list.
    /// The file is likely from a different institution, or the format changed.
    #[error("CSV header does not match the '{institution}' format (expected {expected:?}, found {found:?})")]
    FormatMismatch {
        institution: &'static str,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("No adapter registered for institution '{0}'")]
    UnknownInstitution(String),
    /// Aborts the remainder of the file; `line` and `raw` identify the
    /// offending row for diagnosis.
    #[error("Line {line} failed to parse: {source} (row: {raw})")]
    Row {
        line: u64,
        raw: String,
        #[source]
        source: RowError,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
