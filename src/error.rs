//! Error types for the karaoke recommender
//!
//! Catalog loading collects per-row problems into a single bulk failure;
//! request-level failures stay distinct so callers can tell the user what to fix.

use serde::Serialize;
use thiserror::Error;

/// Convenience Result type for library operations
pub type Result<T> = std::result::Result<T, KaraokeError>;

/// Validation failure for a single catalog record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SongValidationError {
    /// 1-based line in the source file (the header is line 1), if known
    pub row_index: Option<usize>,
    pub message: String,
}

impl SongValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            row_index: None,
            message: message.into(),
        }
    }

    /// Attach the source line this error was raised for
    pub fn at_row(mut self, row_index: usize) -> Self {
        self.row_index = Some(row_index);
        self
    }

    /// Human readable form including the row marker
    pub fn describe(&self) -> String {
        match self.row_index {
            Some(row) => format!("[row {row}] {}", self.message),
            None => self.message.clone(),
        }
    }
}

fn describe_rows(errors: &[SongValidationError]) -> String {
    errors
        .iter()
        .map(SongValidationError::describe)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Main error type for catalog loading and recommendation
#[derive(Error, Debug)]
pub enum KaraokeError {
    /// One or more catalog rows failed validation; the whole load is rejected
    #[error("{} error(s) while loading catalog:\n{}", .0.len(), describe_rows(.0))]
    BulkLoad(Vec<SongValidationError>),

    /// Required catalog columns are absent
    #[error("missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// No songs exist anywhere, even after the full fallback chain
    #[error("song catalog is empty")]
    EmptyCatalog,

    /// Request is missing data required before any computation
    #[error("{0} are required")]
    EmptyInput(String),

    /// Engine configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog source could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog source is not readable as CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Programming defect surfaced instead of a misleading result
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KaraokeError {
    /// Whether the caller can fix this by changing their input or data
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            KaraokeError::BulkLoad(_)
                | KaraokeError::MissingColumns(_)
                | KaraokeError::EmptyCatalog
                | KaraokeError::EmptyInput(_)
                | KaraokeError::Config(_)
        )
    }
}

/// Structured error record emitted at the service boundary
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&KaraokeError> for ErrorResponse {
    fn from(err: &KaraokeError) -> Self {
        match err {
            KaraokeError::BulkLoad(errors) => ErrorResponse {
                error: format!("{} error(s) while loading catalog", errors.len()),
                details: Some(describe_rows(errors)),
            },
            KaraokeError::MissingColumns(columns) => ErrorResponse {
                error: "catalog is missing required columns".to_string(),
                details: Some(columns.join(", ")),
            },
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        }
    }
}
