//! Equality rules for grading outputs.
//!
//! Numbers are compared with a combined absolute/relative tolerance:
//! `a` is close to the reference `b` when `|a - b| <= ATOL + RTOL * |b|`.
//! Everything else is compared exactly. [`outputs_match`] picks the rule
//! from the expected output's tag and the task kind.
//!
//! # Module Organization
//!
//! - [`error`]: Comparison errors
//! - [`partitioned`]: Map/reduce and partitioned result comparison

mod error;
mod partitioned;

pub use error::ComparisonError;
pub use partitioned::{
    map_reduce_results_equal, partitioned_collection_results_equal,
    partitioned_table_results_equal,
};

use crate::codec::{PlainKind, TaggedValue, TypeTag, ValueCodec};
use crate::error::Result;
use crate::logging::debug;
use crate::mapreduce::partitions_from_value;
use crate::runner::TaskKind;
use crate::value::{NdArray, Table, Value};

/// Relative tolerance for numeric comparison.
pub const RTOL: f64 = 1e-5;

/// Absolute tolerance for numeric comparison.
pub const ATOL: f64 = 1e-5;

/// Whether `a` is within tolerance of the reference `b`.
///
/// Equal infinities are close; NaN is never close to anything.
pub fn close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    (a - b).abs() <= ATOL + RTOL * b.abs()
}

/// Compare two scalars. `b` is the reference value.
///
/// When both are numeric and at least one is a float the tolerance rule
/// applies. Otherwise the values must be exactly equal.
pub fn scalars_equal(a: &Value, b: &Value) -> bool {
    if a.is_numeric() && b.is_numeric() && (a.is_float() || b.is_float()) {
        return match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => close(x, y),
            _ => false,
        };
    }
    a == b
}

/// Arrays are equal when their shapes match and every element of `actual`
/// is close to the corresponding element of `expected`.
pub fn array_equal(expected: &NdArray, actual: &NdArray) -> bool {
    expected.shape() == actual.shape()
        && expected
            .data()
            .iter()
            .zip(actual.data())
            .all(|(e, a)| close(*a, *e))
}

/// Tables are equal when they have the same column names and the same
/// multiset of rows.
///
/// Column order and row order are ignored. Cells compare exactly.
pub fn table_equal(expected: &Table, actual: &Table) -> bool {
    if expected.num_rows() != actual.num_rows() {
        return false;
    }
    let Some(mut actual_rows) = actual.rows_in_column_order(expected.columns()) else {
        return false;
    };
    let mut expected_rows = expected.rows().to_vec();
    expected_rows.sort();
    actual_rows.sort();
    expected_rows == actual_rows
}

/// Decide whether `actual` matches the `expected` envelope for a task of
/// `kind`.
///
/// Float, array and table expectations use their own rule whatever the
/// task kind. Otherwise the kind decides: map/reduce output is compared as
/// key/value partitions, partitioned output through its encoded envelope,
/// and everything else exactly.
pub fn outputs_match(
    kind: TaskKind,
    expected: &TaggedValue,
    actual: &Value,
    codec: &ValueCodec,
) -> Result<bool> {
    match &expected.type_tag {
        TypeTag::Plain(PlainKind::Float) => {
            let expected = codec.decode(expected)?;
            return Ok(float_matches(&expected, actual));
        }
        TypeTag::Array => {
            let expected = codec.decode(expected)?;
            return Ok(match (expected.as_array(), actual.as_array()) {
                (Some(e), Some(a)) => array_equal(e, a),
                _ => false,
            });
        }
        TypeTag::Table => {
            let expected = codec.decode(expected)?;
            return Ok(match (expected.as_table(), actual.as_table()) {
                (Some(e), Some(a)) => table_equal(e, a),
                _ => false,
            });
        }
        _ => {}
    }

    let matched = match kind {
        TaskKind::MapReduce => {
            let expected_value = codec.decode(expected)?;
            let expected_parts = partitions_from_value(&expected_value).ok_or_else(|| {
                ComparisonError::MalformedResult(
                    "expected output is not a list of key/value partitions".to_string(),
                )
            })?;
            let actual_parts = partitions_from_value(actual).ok_or_else(|| {
                ComparisonError::MalformedResult(format!(
                    "map/reduce output is a {}, not a list of key/value partitions",
                    actual.type_name()
                ))
            })?;
            map_reduce_results_equal(&expected_parts, &actual_parts)
        }
        TaskKind::PartitionedCollection => {
            require_tag(kind, expected, &TypeTag::PartitionedCollection)?;
            partitioned_collection_results_equal(expected, &codec.encode(actual))?
        }
        TaskKind::PartitionedTable => {
            require_tag(kind, expected, &TypeTag::PartitionedTable)?;
            partitioned_table_results_equal(expected, &codec.encode(actual))?
        }
        TaskKind::Standard | TaskKind::SqlQuery => {
            if expected.type_tag.is_partitioned() {
                return Err(unrecognized(kind, expected).into());
            }
            codec.decode(expected)? == *actual
        }
    };

    if !matched {
        debug!(%kind, tag = %expected.type_tag, "output mismatch");
    }
    Ok(matched)
}

/// A float expectation accepts any number within tolerance, or an array
/// whose every element is.
fn float_matches(expected: &Value, actual: &Value) -> bool {
    match actual {
        Value::Array(array) => {
            let Some(reference) = expected.as_f64() else {
                return false;
            };
            array.data().iter().all(|x| close(*x, reference))
        }
        _ if actual.is_numeric() => scalars_equal(actual, expected),
        _ => false,
    }
}

fn require_tag(kind: TaskKind, expected: &TaggedValue, tag: &TypeTag) -> Result<()> {
    if expected.type_tag == *tag {
        Ok(())
    } else {
        Err(unrecognized(kind, expected).into())
    }
}

fn unrecognized(kind: TaskKind, expected: &TaggedValue) -> ComparisonError {
    ComparisonError::UnrecognizedOutput {
        kind,
        category: expected.category(),
    }
}
