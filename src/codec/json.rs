//! Conversions between [`Value`] and JSON data.

use serde_json::{Map, Number, Value as JsonValue};

use crate::value::Value;

/// Infer a [`Value`] from the shape of JSON data.
///
/// Integral numbers that fit `i64` become `Int`, every other number is a
/// `Float`. Arrays become lists and objects become dictionaries.
pub fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::None,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => number_to_value(n),
        JsonValue::String(s) => Value::Str(s.clone()),
        JsonValue::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        JsonValue::Object(fields) => Value::Dict(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), json_to_value(value)))
                .collect(),
        ),
    }
}

fn number_to_value(n: &Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Int(i),
        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

/// Render a [`Value`] as JSON data. Total: every value has a rendering.
///
/// Non-finite floats become `null`. Arrays render as nested lists, tables as
/// `{column: [values...]}`, partitioned collections as their collected items
/// and partitioned tables as a list of row objects.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::None => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::Number(Number::from(*i)),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::List(items) | Value::Tuple(items) => {
            JsonValue::Array(items.iter().map(value_to_json).collect())
        }
        Value::Dict(map) => JsonValue::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), value_to_json(value)))
                .collect(),
        ),
        Value::Array(array) => value_to_json(&array.to_nested()),
        Value::Table(table) => JsonValue::Object(
            table
                .to_columns()
                .into_iter()
                .map(|(name, values)| {
                    (
                        name,
                        JsonValue::Array(values.iter().map(value_to_json).collect()),
                    )
                })
                .collect(),
        ),
        Value::Collection(dataset) => {
            JsonValue::Array(dataset.collect().iter().map(value_to_json).collect())
        }
        Value::Frame(frame) => JsonValue::Array(
            frame
                .collect()
                .iter()
                .map(|row| JsonValue::Object(row_object(frame.columns(), row)))
                .collect(),
        ),
    }
}

/// JSON object for one table row. Null fields are omitted.
pub(crate) fn row_object(columns: &[String], row: &[Value]) -> Map<String, JsonValue> {
    columns
        .iter()
        .zip(row)
        .filter(|(_, value)| !matches!(value, Value::None))
        .map(|(column, value)| (column.clone(), value_to_json(value)))
        .collect()
}

/// Short name of a JSON value's kind, for error messages.
pub(crate) fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
