//! Local map/reduce pipeline.
//!
//! A run has three phases:
//!
//! 1. **map**: every `(key, value)` pair of every input partition is passed to
//!    the map callback, which emits zero or more intermediate pairs.
//! 2. **shuffle**: each intermediate pair is routed to reducer partition
//!    `hash(key) % num_reducers`. Within a reducer, values are grouped by key
//!    in the order they were emitted.
//! 3. **reduce**: every group is passed to the reduce callback, whose output
//!    pairs form that reducer's output partition.
//!
//! The output always has exactly `num_reducers` partitions, some possibly
//! empty. Keys are routed with a CRC-32 of their [`Hash`] encoding, so the
//! layout is deterministic across runs. Integers hash in native byte order,
//! so hosts of different endianness may place keys differently.

mod error;

pub use error::PipelineError;

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::logging::{debug, trace};
use crate::value::Value;

/// Reducer partition count used when a caller does not choose one.
pub const DEFAULT_NUM_REDUCERS: usize = 2;

/// Ordered `(key, value)` pairs; the unit of input and output of a run.
pub type KeyValuePartition = Vec<(Value, Value)>;

/// Boxed map callback: `(key, value) -> [(key, value)]`.
pub type MapFn = Box<dyn Fn(&Value, &Value) -> anyhow::Result<Vec<(Value, Value)>>>;

/// Boxed reduce callback: `(key, values) -> [(key, value)]`.
pub type ReduceFn = Box<dyn Fn(&Value, &[Value]) -> anyhow::Result<Vec<(Value, Value)>>>;

/// A map callback paired with its reduce callback.
pub struct MapReduceJob {
    map: MapFn,
    reduce: ReduceFn,
}

impl std::fmt::Debug for MapReduceJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapReduceJob").finish_non_exhaustive()
    }
}

impl MapReduceJob {
    pub fn new<M, R>(map: M, reduce: R) -> Self
    where
        M: Fn(&Value, &Value) -> anyhow::Result<Vec<(Value, Value)>> + 'static,
        R: Fn(&Value, &[Value]) -> anyhow::Result<Vec<(Value, Value)>> + 'static,
    {
        Self {
            map: Box::new(map),
            reduce: Box::new(reduce),
        }
    }

    /// Run the job over `input` with `num_reducers` reducer partitions.
    pub fn run(
        &self,
        input: &[KeyValuePartition],
        num_reducers: usize,
    ) -> Result<Vec<KeyValuePartition>, PipelineError> {
        run(input, &*self.map, &*self.reduce, num_reducers)
    }
}

/// Values grouped by key, in first-seen key order.
#[derive(Debug, Clone, Default)]
pub struct ReduceGroup {
    index: HashMap<Value, usize>,
    groups: Vec<(Value, Vec<Value>)>,
}

impl ReduceGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the group of `key`, creating the group if needed.
    pub fn push(&mut self, key: Value, value: Value) {
        match self.index.get(&key).and_then(|&i| self.groups.get_mut(i)) {
            Some((_, values)) => values.push(value),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![value]));
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&[Value]> {
        let i = *self.index.get(key)?;
        self.groups.get(i).map(|(_, values)| values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &[Value])> {
        self.groups.iter().map(|(key, values)| (key, values.as_slice()))
    }
}

/// Reducer partition that `key` is routed to.
///
/// `num_reducers` must be non-zero.
pub fn reducer_for(key: &Value, num_reducers: usize) -> usize {
    let mut hasher = crc32fast::Hasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();
    (hash % num_reducers.max(1) as u64) as usize
}

/// Run `map_fn` and `reduce_fn` over `input` with `num_reducers` reducers.
pub fn run<M, R>(
    input: &[KeyValuePartition],
    map_fn: M,
    reduce_fn: R,
    num_reducers: usize,
) -> Result<Vec<KeyValuePartition>, PipelineError>
where
    M: Fn(&Value, &Value) -> anyhow::Result<Vec<(Value, Value)>>,
    R: Fn(&Value, &[Value]) -> anyhow::Result<Vec<(Value, Value)>>,
{
    if num_reducers == 0 {
        return Err(PipelineError::NoReducers);
    }
    debug!(
        partitions = input.len(),
        num_reducers, "starting map/reduce run"
    );

    let mapped = map_phase(input, &map_fn)?;
    let groups = shuffle(mapped, num_reducers);
    let output = reduce_phase(&groups, &reduce_fn)?;

    debug!(
        pairs = output.iter().map(Vec::len).sum::<usize>(),
        "map/reduce run complete"
    );
    Ok(output)
}

fn map_phase<M>(input: &[KeyValuePartition], map_fn: &M) -> Result<Vec<(Value, Value)>, PipelineError>
where
    M: Fn(&Value, &Value) -> anyhow::Result<Vec<(Value, Value)>>,
{
    let mut mapped = Vec::new();
    for (partition, pairs) in input.iter().enumerate() {
        for (key, value) in pairs {
            let emitted = map_fn(key, value).map_err(|source| PipelineError::Map {
                partition,
                key: key.to_string(),
                source,
            })?;
            mapped.extend(emitted);
        }
        trace!(partition, pairs = pairs.len(), "mapped input partition");
    }
    Ok(mapped)
}

fn shuffle(mapped: Vec<(Value, Value)>, num_reducers: usize) -> Vec<ReduceGroup> {
    let mut groups = vec![ReduceGroup::new(); num_reducers];
    for (key, value) in mapped {
        let target = reducer_for(&key, num_reducers);
        if let Some(group) = groups.get_mut(target) {
            group.push(key, value);
        }
    }
    trace!(
        keys = ?groups.iter().map(ReduceGroup::len).collect::<Vec<_>>(),
        "shuffled intermediate pairs"
    );
    groups
}

fn reduce_phase<R>(groups: &[ReduceGroup], reduce_fn: &R) -> Result<Vec<KeyValuePartition>, PipelineError>
where
    R: Fn(&Value, &[Value]) -> anyhow::Result<Vec<(Value, Value)>>,
{
    groups
        .iter()
        .enumerate()
        .map(|(partition, group)| {
            let mut output = Vec::new();
            for (key, values) in group.iter() {
                let reduced = reduce_fn(key, values).map_err(|source| PipelineError::Reduce {
                    partition,
                    key: key.to_string(),
                    source,
                })?;
                output.extend(reduced);
            }
            Ok(output)
        })
        .collect()
}

/// Read partitions out of a list of lists of two-item pairs.
pub fn partitions_from_value(value: &Value) -> Option<Vec<KeyValuePartition>> {
    value
        .as_list()?
        .iter()
        .map(|partition| {
            partition
                .as_list()?
                .iter()
                .map(|pair| pair.as_pair().map(|(k, v)| (k.clone(), v.clone())))
                .collect()
        })
        .collect()
}

/// Inverse of [`partitions_from_value`]; pairs become tuples.
pub fn partitions_to_value(partitions: &[KeyValuePartition]) -> Value {
    Value::List(
        partitions
            .iter()
            .map(|partition| {
                Value::List(
                    partition
                        .iter()
                        .map(|(k, v)| Value::pair(k.clone(), v.clone()))
                        .collect(),
                )
            })
            .collect(),
    )
}
