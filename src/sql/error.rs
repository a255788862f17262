//! Error types for query execution.

use thiserror::Error;

use crate::value::ShapeError;

/// Errors raised while running a submitted query.
#[derive(Error, Debug)]
pub enum QueryError {
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Query inputs are registered as tables, so every input must be one.
    #[error("Query input '{0}' is a {1}, not a table")]
    NotATable(String, &'static str),

    #[error("Query result is not a valid table: {0}")]
    Shape(#[from] ShapeError),

    #[error("No query engine available (build with the `sqlite` feature)")]
    Unavailable,
}
