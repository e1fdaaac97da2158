//! Error types for the data-loader crate.
//!
//! Every variant here is a fatal load failure: the caller cannot build a
//! usable similarity matrix without a clean catalog and ratings table.

use thiserror::Error;

/// Errors that can occur during data loading, parsing and joining
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Record in a data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: u64,
        reason: String,
    },

    /// Header row lacks a column the join depends on
    #[error("Missing required column '{column}' in {file}")]
    MissingColumn { file: String, column: String },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Joining ratings to the catalog left nothing to work with
    #[error("Joining {ratings} ratings against {movies} movies produced no rows")]
    EmptyJoin { movies: usize, ratings: usize },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
