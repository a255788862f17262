//! Tagged value encoding and decoding.
//!
//! The [`ValueCodec`] turns a [`Value`] into a [`TaggedValue`] (a JSON
//! payload plus an explicit category tag) and back. Encoding is pure and
//! total. Decoding plain, array and table values is pure as well; decoding
//! partitioned values needs an [`ExecutionContext`] to rebuild the
//! distributed handle.
//!
//! # Module Organization
//!
//! - [`error`]: Decode errors
//! - [`tagged`]: The envelope and its type tags
//! - [`json`]: Value/JSON conversions

mod error;
mod json;
mod tagged;

pub use error::DecodeError;
pub use json::{json_to_value, value_to_json};
pub use tagged::{PlainKind, TaggedValue, TypeTag};

pub(crate) use json::{json_kind, row_object};

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::dataset::{ExecutionContext, LocalContext};
use crate::logging::{debug, trace};
use crate::value::{NdArray, Table, Value};

/// Encoder/decoder between [`Value`] and [`TaggedValue`].
///
/// # Example
///
/// ```ignore
/// use automark::codec::ValueCodec;
/// use automark::Value;
///
/// let codec = ValueCodec::local();
/// let tagged = codec.encode(&Value::Int(3));
/// assert_eq!(codec.decode(&tagged)?, Value::Int(3));
/// ```
#[derive(Clone, Default)]
pub struct ValueCodec {
    context: Option<Arc<dyn ExecutionContext>>,
}

impl fmt::Debug for ValueCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCodec")
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

impl ValueCodec {
    /// Codec without an execution context. Partitioned values cannot be
    /// decoded.
    pub fn new() -> Self {
        Self { context: None }
    }

    /// Codec that rebuilds partitioned values through `context`.
    pub fn with_context(context: Arc<dyn ExecutionContext>) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// Codec backed by the single-process [`LocalContext`].
    pub fn local() -> Self {
        Self::with_context(Arc::new(LocalContext::new()))
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Encode a value into its tagged envelope.
    pub fn encode(&self, value: &Value) -> TaggedValue {
        match value {
            Value::Array(_) => TaggedValue::new(value_to_json(value), TypeTag::Array),
            Value::Table(_) => TaggedValue::new(value_to_json(value), TypeTag::Table),
            Value::Collection(dataset) => TaggedValue::partitioned(
                value_to_json(value),
                TypeTag::PartitionedCollection,
                dataset.num_partitions(),
            ),
            Value::Frame(frame) => {
                // Rows travel as JSON object texts.
                let rows = frame
                    .collect()
                    .iter()
                    .map(|row| {
                        JsonValue::String(JsonValue::Object(row_object(frame.columns(), row)).to_string())
                    })
                    .collect();
                TaggedValue::partitioned(
                    JsonValue::Array(rows),
                    TypeTag::PartitionedTable,
                    frame.num_partitions(),
                )
            }
            plain => TaggedValue::new(value_to_json(plain), TypeTag::Plain(plain_kind(plain))),
        }
    }

    /// Decode a tagged envelope back into a value.
    pub fn decode(&self, tagged: &TaggedValue) -> Result<Value, DecodeError> {
        trace!(tag = %tagged.type_tag, "decoding tagged value");
        match &tagged.type_tag {
            TypeTag::Array => Ok(Value::Array(NdArray::from_nested(&json_to_value(
                &tagged.data,
            ))?)),
            TypeTag::Table => Ok(Value::Table(decode_table(&tagged.data)?)),
            TypeTag::PartitionedCollection => {
                let (context, num_partitions) = self.partitioned_parts(tagged)?;
                let items = expect_array(&tagged.type_tag, &tagged.data)?
                    .iter()
                    .map(decode_record)
                    .collect();
                Ok(Value::Collection(context.parallelize(items, num_partitions)?))
            }
            TypeTag::PartitionedTable => {
                let (context, num_partitions) = self.partitioned_parts(tagged)?;
                let records = expect_array(&tagged.type_tag, &tagged.data)?
                    .iter()
                    .map(|record| match record {
                        JsonValue::String(text) => Ok(text.clone()),
                        JsonValue::Object(_) => Ok(record.to_string()),
                        other => Err(DecodeError::MalformedRecord(format!(
                            "expected a JSON text row, got {}",
                            json_kind(other)
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Frame(context.read_json(&records, num_partitions)?))
            }
            TypeTag::Plain(kind) => decode_plain(&tagged.type_tag, kind, &tagged.data),
        }
    }

    fn partitioned_parts(
        &self,
        tagged: &TaggedValue,
    ) -> Result<(&Arc<dyn ExecutionContext>, usize), DecodeError> {
        let num_partitions = tagged
            .num_partitions
            .ok_or_else(|| DecodeError::MissingPartitions(tagged.type_tag.clone()))?;
        let context = self
            .context
            .as_ref()
            .ok_or_else(|| DecodeError::ContextUnavailable(tagged.type_tag.clone()))?;
        Ok((context, num_partitions))
    }
}

fn plain_kind(value: &Value) -> PlainKind {
    match value {
        Value::None => PlainKind::None,
        Value::Bool(_) => PlainKind::Bool,
        Value::Int(_) => PlainKind::Int,
        Value::Float(_) => PlainKind::Float,
        Value::Str(_) => PlainKind::Str,
        Value::Tuple(_) => PlainKind::Tuple,
        Value::Dict(_) => PlainKind::Dict,
        _ => PlainKind::List,
    }
}

fn expect_array<'a>(tag: &TypeTag, data: &'a JsonValue) -> Result<&'a [JsonValue], DecodeError> {
    match data {
        JsonValue::Array(items) => Ok(items.as_slice()),
        other => Err(mismatch(tag, "array", other)),
    }
}

fn mismatch(tag: &TypeTag, expected: &'static str, got: &JsonValue) -> DecodeError {
    DecodeError::TypeMismatch {
        tag: tag.clone(),
        expected,
        got: json_kind(got).to_string(),
    }
}

/// Two-item arrays inside a partitioned collection are `(key, value)` records.
fn decode_record(json: &JsonValue) -> Value {
    match json_to_value(json) {
        Value::List(items) if items.len() == 2 => Value::Tuple(items),
        other => other,
    }
}

fn decode_table(data: &JsonValue) -> Result<Table, DecodeError> {
    let fields = match data {
        JsonValue::Object(fields) => fields,
        other => return Err(mismatch(&TypeTag::Table, "object", other)),
    };

    let mut columns = Vec::with_capacity(fields.len());
    for (name, column) in fields {
        let values = match column {
            JsonValue::Array(values) => values.iter().map(json_to_value).collect(),
            // Indexed form: {"0": v0, "1": v1, ...}
            JsonValue::Object(indexed) => {
                let mut entries: Vec<(&String, &JsonValue)> = indexed.iter().collect();
                entries.sort_by(|(a, _), (b, _)| match (a.parse::<i64>(), b.parse::<i64>()) {
                    (Ok(a), Ok(b)) => a.cmp(&b),
                    _ => a.cmp(b),
                });
                entries.into_iter().map(|(_, v)| json_to_value(v)).collect()
            }
            other => return Err(mismatch(&TypeTag::Table, "array or object column", other)),
        };
        columns.push((name.clone(), values));
    }
    Ok(Table::from_columns(columns)?)
}

fn decode_plain(tag: &TypeTag, kind: &PlainKind, data: &JsonValue) -> Result<Value, DecodeError> {
    match (kind, data) {
        (PlainKind::None, JsonValue::Null) => Ok(Value::None),
        (PlainKind::Bool, JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
        (PlainKind::Int, JsonValue::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| mismatch(tag, "integer", data)),
        (PlainKind::Float, JsonValue::Number(n)) => {
            Ok(Value::Float(n.as_f64().unwrap_or(f64::NAN)))
        }
        // Non-finite floats are encoded as null.
        (PlainKind::Float, JsonValue::Null) => Ok(Value::Float(f64::NAN)),
        (PlainKind::Str, JsonValue::String(s)) => Ok(Value::Str(s.clone())),
        (PlainKind::List, JsonValue::Array(items)) => {
            Ok(Value::List(items.iter().map(json_to_value).collect()))
        }
        (PlainKind::Tuple, JsonValue::Array(items)) => {
            Ok(Value::Tuple(items.iter().map(json_to_value).collect()))
        }
        (PlainKind::Dict, JsonValue::Object(_)) => Ok(json_to_value(data)),
        (PlainKind::Other(name), _) => {
            debug!(type_name = %name, "decoding unknown plain type from its JSON shape");
            Ok(json_to_value(data))
        }
        (known, _) => Err(mismatch(tag, known_expectation(known), data)),
    }
}

fn known_expectation(kind: &PlainKind) -> &'static str {
    match kind {
        PlainKind::None => "null",
        PlainKind::Bool => "bool",
        PlainKind::Int => "integer",
        PlainKind::Float => "number",
        PlainKind::Str => "string",
        PlainKind::List | PlainKind::Tuple => "array",
        PlainKind::Dict => "object",
        PlainKind::Other(_) => "any",
    }
}
