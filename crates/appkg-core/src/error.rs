//! Centralized error types for AppKG.

use thiserror::Error;

/// Main error type for AppKG core operations.
#[derive(Error, Debug)]
pub enum AppkgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Table has no header row: {0}")]
    MissingHeader(String),

    #[error("Required column not found: {0}")]
    MissingColumn(String),
}

/// Result type for AppKG core operations.
pub type AppkgResult<T> = Result<T, AppkgError>;

/// A source row that cannot become an App node.
///
/// Rows rejected this way are dropped before reaching the store and are not
/// counted as write failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipRow {
    #[error("row {line} has no usable identifier")]
    MissingId { line: usize },
}
