//! Distributed execution context for partitioned values.
//!
//! Partitioned collections and partitioned tables only exist relative to an
//! execution context that knows how to split data into partitions. The
//! harness ships a single-process [`LocalContext`]; other backends implement
//! [`ExecutionContext`].

use std::collections::BTreeSet;

use serde_json::Value as JsonValue;

use crate::codec::{DecodeError, json_to_value};
use crate::logging::debug;
use crate::value::Value;

/// Backend able to distribute data across partitions.
pub trait ExecutionContext: Send + Sync {
    /// Distribute `items` across exactly `num_partitions` partitions.
    fn parallelize(&self, items: Vec<Value>, num_partitions: usize) -> Result<Dataset, DecodeError>;

    /// Parse JSON object records into a partitioned table.
    fn read_json(&self, records: &[String], num_partitions: usize) -> Result<DataFrame, DecodeError>;
}

/// Handle to a collection split across partitions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dataset {
    partitions: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn from_partitions(partitions: Vec<Vec<Value>>) -> Self {
        Self { partitions }
    }

    pub fn partitions(&self) -> &[Vec<Value>] {
        &self.partitions
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// All items, partition by partition.
    pub fn collect(&self) -> Vec<Value> {
        self.partitions.iter().flatten().cloned().collect()
    }
}

/// Handle to a table whose rows are split across partitions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DataFrame {
    columns: Vec<String>,
    partitions: Vec<Vec<Vec<Value>>>,
}

impl DataFrame {
    pub fn from_partitions(columns: Vec<String>, partitions: Vec<Vec<Vec<Value>>>) -> Self {
        Self {
            columns,
            partitions,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn partitions(&self) -> &[Vec<Vec<Value>>] {
        &self.partitions
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    /// All rows, partition by partition.
    pub fn collect(&self) -> Vec<Vec<Value>> {
        self.partitions.iter().flatten().cloned().collect()
    }
}

/// Single-process execution context.
///
/// Partition `i` of `n` holds the contiguous slice `[i*len/n, (i+1)*len/n)`,
/// so partitions are balanced and there are always exactly `n` of them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalContext;

impl LocalContext {
    pub fn new() -> Self {
        Self
    }
}

/// Split `items` into `num_partitions` contiguous slices.
pub(crate) fn slice_partitions<T>(items: Vec<T>, num_partitions: usize) -> Result<Vec<Vec<T>>, DecodeError> {
    if num_partitions == 0 {
        return Err(DecodeError::InvalidPartitionCount(num_partitions));
    }
    let len = items.len();
    let mut partitions = Vec::with_capacity(num_partitions);
    let mut iter = items.into_iter();
    let mut start = 0;
    for index in 0..num_partitions {
        let end = (index + 1) * len / num_partitions;
        partitions.push(iter.by_ref().take(end - start).collect());
        start = end;
    }
    Ok(partitions)
}

impl ExecutionContext for LocalContext {
    fn parallelize(&self, items: Vec<Value>, num_partitions: usize) -> Result<Dataset, DecodeError> {
        debug!(items = items.len(), num_partitions, "parallelizing collection");
        Ok(Dataset::from_partitions(slice_partitions(items, num_partitions)?))
    }

    fn read_json(&self, records: &[String], num_partitions: usize) -> Result<DataFrame, DecodeError> {
        let mut objects = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_str::<JsonValue>(record)? {
                JsonValue::Object(fields) => objects.push(fields),
                other => {
                    return Err(DecodeError::MalformedRecord(format!(
                        "expected a JSON object, got {}",
                        other
                    )));
                }
            }
        }

        // Schema is the sorted union of every record's fields.
        let columns: Vec<String> = objects
            .iter()
            .flat_map(|fields| fields.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = objects
            .iter()
            .map(|fields| {
                columns
                    .iter()
                    .map(|column| fields.get(column).map(json_to_value).unwrap_or(Value::None))
                    .collect()
            })
            .collect();

        debug!(rows = records.len(), num_partitions, "reading json records");
        Ok(DataFrame::from_partitions(
            columns,
            slice_partitions(rows, num_partitions)?,
        ))
    }
}
