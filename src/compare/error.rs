//! Error types for output comparison.

use thiserror::Error;

use crate::runner::TaskKind;
use crate::value::ValueCategory;

/// Errors raised when an expected output cannot be compared at all.
///
/// A mismatch between comparable outputs is not an error; comparison
/// functions report it as `false`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComparisonError {
    /// The expected output's category is not valid for the task kind.
    #[error("Unrecognized output for {kind} task: expected value is a {category}")]
    UnrecognizedOutput {
        kind: TaskKind,
        category: ValueCategory,
    },

    /// A result payload does not have the shape its tag promises.
    #[error("Malformed result: {0}")]
    MalformedResult(String),
}
