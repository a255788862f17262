//! Error types for tagged value decoding.

use thiserror::Error;

use super::tagged::TypeTag;
use crate::value::ShapeError;

/// Errors that can occur while decoding a [`TaggedValue`](super::TaggedValue).
///
/// A decode failure means the producer and consumer disagree about the wire
/// format, so these always propagate to the caller.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("No execution context available to decode a '{0}' value")]
    ContextUnavailable(TypeTag),

    #[error("'{0}' value is missing num_partitions")]
    MissingPartitions(TypeTag),

    #[error("Invalid partition count: {0}")]
    InvalidPartitionCount(usize),

    #[error("Type mismatch for '{tag}': expected {expected}, got {got}")]
    TypeMismatch {
        tag: TypeTag,
        expected: &'static str,
        got: String,
    },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid shape: {0}")]
    Shape(#[from] ShapeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
