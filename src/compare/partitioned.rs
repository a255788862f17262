//! Comparison of map/reduce output and partitioned result envelopes.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use super::error::ComparisonError;
use super::scalars_equal;
use crate::codec::{TaggedValue, TypeTag, json_kind, json_to_value};
use crate::mapreduce::KeyValuePartition;
use crate::value::Value;

/// Compare two map/reduce outputs as key/value mappings.
///
/// Partition boundaries are ignored. Each side is flattened into a single
/// mapping; if a key appears more than once on one side, the last
/// occurrence wins. The mappings must have the same keys and every value
/// must satisfy [`scalars_equal`] against its expected counterpart.
pub fn map_reduce_results_equal(
    expected: &[KeyValuePartition],
    actual: &[KeyValuePartition],
) -> bool {
    let expected = flatten(expected);
    let actual = flatten(actual);
    expected.len() == actual.len()
        && expected.iter().all(|(key, want)| {
            actual
                .get(key)
                .is_some_and(|got| scalars_equal(got, want))
        })
}

fn flatten(partitions: &[KeyValuePartition]) -> HashMap<&Value, &Value> {
    partitions
        .iter()
        .flatten()
        .map(|(key, value)| (key, value))
        .collect()
}

/// Compare two encoded partitioned collections of `(key, value)` records.
///
/// Partition counts must match. Records are then sorted by key and compared
/// pairwise: keys exactly, values with [`scalars_equal`].
pub fn partitioned_collection_results_equal(
    expected: &TaggedValue,
    actual: &TaggedValue,
) -> Result<bool, ComparisonError> {
    if actual.type_tag != TypeTag::PartitionedCollection
        || expected.num_partitions != actual.num_partitions
    {
        return Ok(false);
    }
    let expected = sorted_records(expected)?;
    let actual = sorted_records(actual)?;
    Ok(expected.len() == actual.len()
        && expected
            .iter()
            .zip(&actual)
            .all(|((ek, ev), (ak, av))| ek == ak && scalars_equal(av, ev)))
}

fn sorted_records(tagged: &TaggedValue) -> Result<Vec<(Value, Value)>, ComparisonError> {
    let mut records = payload_items(tagged)?
        .iter()
        .map(|item| {
            json_to_value(item)
                .as_pair()
                .map(|(k, v)| (k.clone(), v.clone()))
                .ok_or_else(|| {
                    ComparisonError::MalformedResult(format!(
                        "partitioned collection record is not a key/value pair: {}",
                        item
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    records.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(records)
}

/// Compare two encoded partitioned tables of JSON text rows.
///
/// Partition counts must match. Each row's fields are ordered by column
/// name, rows are sorted field by field, and the tables are compared cell by
/// cell with [`scalars_equal`].
pub fn partitioned_table_results_equal(
    expected: &TaggedValue,
    actual: &TaggedValue,
) -> Result<bool, ComparisonError> {
    if actual.type_tag != TypeTag::PartitionedTable
        || expected.num_partitions != actual.num_partitions
    {
        return Ok(false);
    }
    let expected = sorted_rows(expected)?;
    let actual = sorted_rows(actual)?;
    Ok(expected.len() == actual.len()
        && expected.iter().zip(&actual).all(|(e, a)| {
            e.len() == a.len() && e.iter().zip(a).all(|(ev, av)| scalars_equal(av, ev))
        }))
}

fn sorted_rows(tagged: &TaggedValue) -> Result<Vec<Vec<Value>>, ComparisonError> {
    let mut rows = payload_items(tagged)?
        .iter()
        .map(parse_row)
        .collect::<Result<Vec<_>, _>>()?;
    rows.sort();
    Ok(rows)
}

/// Field values of one row, ordered by field name.
fn parse_row(row: &JsonValue) -> Result<Vec<Value>, ComparisonError> {
    let parsed;
    let object = match row {
        JsonValue::String(text) => {
            parsed = serde_json::from_str::<JsonValue>(text)
                .map_err(|e| ComparisonError::MalformedResult(format!("invalid row {:?}: {}", text, e)))?;
            &parsed
        }
        other => other,
    };
    let JsonValue::Object(fields) = object else {
        return Err(ComparisonError::MalformedResult(format!(
            "partitioned table row is a {}, not an object",
            json_kind(object)
        )));
    };
    let mut fields: Vec<_> = fields.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    Ok(fields.into_iter().map(|(_, value)| json_to_value(value)).collect())
}

fn payload_items(tagged: &TaggedValue) -> Result<&[JsonValue], ComparisonError> {
    match &tagged.data {
        JsonValue::Array(items) => Ok(items.as_slice()),
        other => Err(ComparisonError::MalformedResult(format!(
            "'{}' payload is a {}, not an array",
            tagged.type_tag,
            json_kind(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kv(pairs: &[(&str, f64)]) -> KeyValuePartition {
        pairs
            .iter()
            .map(|(k, v)| (Value::from(*k), Value::Float(*v)))
            .collect()
    }

    #[test]
    fn test_map_reduce_ignores_partitioning() {
        let expected = vec![kv(&[("a", 1.0), ("b", 2.0)])];
        let actual = vec![kv(&[("b", 2.0)]), kv(&[("a", 1.000001)])];
        assert!(map_reduce_results_equal(&expected, &actual));
    }

    #[test]
    fn test_map_reduce_detects_missing_key() {
        let expected = vec![kv(&[("a", 1.0), ("b", 2.0)])];
        let actual = vec![kv(&[("a", 1.0)]), kv(&[("c", 2.0)])];
        assert!(!map_reduce_results_equal(&expected, &actual));
        assert!(!map_reduce_results_equal(&expected, &[kv(&[("a", 1.0)])]));
    }

    #[test]
    fn test_map_reduce_last_write_wins() {
        let expected = vec![kv(&[("a", 5.0)])];
        let actual = vec![kv(&[("a", 1.0)]), kv(&[("a", 5.0)])];
        assert!(map_reduce_results_equal(&expected, &actual));
    }

    #[test]
    fn test_map_reduce_large_integer_keys() {
        let big = 1i64 << 53;
        let expected = vec![vec![(Value::Int(big + 1), Value::Int(1))]];
        let float_key = vec![vec![(Value::Float(big as f64), Value::Int(1))]];
        assert!(!map_reduce_results_equal(&expected, &float_key));

        let exact_key = vec![vec![(Value::Float(big as f64), Value::Int(1))]];
        let int_key = vec![vec![(Value::Int(big), Value::Int(1))]];
        assert!(map_reduce_results_equal(&int_key, &exact_key));
    }

    fn collection(data: JsonValue, num_partitions: usize) -> TaggedValue {
        TaggedValue::partitioned(data, TypeTag::PartitionedCollection, num_partitions)
    }

    #[test]
    fn test_partitioned_collection_order_insensitive() -> Result<(), ComparisonError> {
        let expected = collection(json!([["a", 1.0], ["b", 2.0]]), 2);
        let actual = collection(json!([["b", 2.0], ["a", 1.000001]]), 2);
        assert!(partitioned_collection_results_equal(&expected, &actual)?);
        Ok(())
    }

    #[test]
    fn test_partitioned_collection_partition_count_matters() -> Result<(), ComparisonError> {
        let expected = collection(json!([["a", 1]]), 2);
        let actual = collection(json!([["a", 1]]), 3);
        assert!(!partitioned_collection_results_equal(&expected, &actual)?);
        Ok(())
    }

    #[test]
    fn test_partitioned_collection_malformed_record() {
        let expected = collection(json!([["a", 1]]), 1);
        let actual = collection(json!([7]), 1);
        assert!(matches!(
            partitioned_collection_results_equal(&expected, &actual),
            Err(ComparisonError::MalformedResult(_))
        ));
    }

    fn frame(rows: JsonValue, num_partitions: usize) -> TaggedValue {
        TaggedValue::partitioned(rows, TypeTag::PartitionedTable, num_partitions)
    }

    #[test]
    fn test_partitioned_table_field_and_row_order() -> Result<(), ComparisonError> {
        let expected = frame(
            json!([r#"{"word": "a", "count": 2}"#, r#"{"word": "b", "count": 1}"#]),
            2,
        );
        let actual = frame(
            json!([r#"{"count": 1, "word": "b"}"#, r#"{"count": 2.000001, "word": "a"}"#]),
            2,
        );
        assert!(partitioned_table_results_equal(&expected, &actual)?);
        Ok(())
    }

    #[test]
    fn test_partitioned_table_partition_count_matters() -> Result<(), ComparisonError> {
        let expected = frame(json!([r#"{"a": 1}"#]), 2);
        let actual = frame(json!([r#"{"a": 1}"#]), 5);
        assert!(!partitioned_table_results_equal(&expected, &actual)?);
        Ok(())
    }

    #[test]
    fn test_partitioned_table_ties_on_first_field() -> Result<(), ComparisonError> {
        let expected = frame(
            json!([r#"{"count": 1, "word": "a"}"#, r#"{"count": 1, "word": "b"}"#]),
            1,
        );
        let actual = frame(
            json!([r#"{"count": 1, "word": "b"}"#, r#"{"count": 1, "word": "a"}"#]),
            1,
        );
        assert!(partitioned_table_results_equal(&expected, &actual)?);
        Ok(())
    }

    #[test]
    fn test_partitioned_table_value_mismatch() -> Result<(), ComparisonError> {
        let expected = frame(json!([r#"{"count": 2}"#]), 1);
        let actual = frame(json!([r#"{"count": 3}"#]), 1);
        assert!(!partitioned_table_results_equal(&expected, &actual)?);
        Ok(())
    }

    #[test]
    fn test_partitioned_table_invalid_row() {
        let expected = frame(json!([r#"{"count": 2}"#]), 1);
        let actual = frame(json!(["not json"]), 1);
        assert!(partitioned_table_results_equal(&expected, &actual).is_err());
    }
}
