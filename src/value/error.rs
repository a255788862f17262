//! Shape errors raised while building arrays and tables.

use thiserror::Error;

/// Structural problems with array or table contents.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("Ragged nested list: sub-lists at the same depth differ in length")]
    Ragged,

    #[error("Non-numeric array element of type '{0}'")]
    NonNumeric(String),

    #[error("Array shape {shape:?} holds {expected} elements, got {got}")]
    ElementCount {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },

    #[error("Row {row} has {got} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Column '{column}' has {got} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),
}
