//! The tagged envelope used to move values across a serialization boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::value::ValueCategory;

/// Name of a plain (non-array, non-table, non-partitioned) value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlainKind {
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Dict,
    /// A type name this codec does not know; decoded from the JSON shape.
    Other(String),
}

impl PlainKind {
    pub fn as_str(&self) -> &str {
        match self {
            PlainKind::None => "none",
            PlainKind::Bool => "bool",
            PlainKind::Int => "int",
            PlainKind::Float => "float",
            PlainKind::Str => "str",
            PlainKind::List => "list",
            PlainKind::Tuple => "tuple",
            PlainKind::Dict => "dict",
            PlainKind::Other(name) => name,
        }
    }
}

/// Category tag carried by every [`TaggedValue`].
///
/// Serialized as a single string: `array`, `table`,
/// `partitioned-collection`, `partitioned-table`, or a plain type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeTag {
    Plain(PlainKind),
    Array,
    Table,
    PartitionedCollection,
    PartitionedTable,
}

impl TypeTag {
    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Plain(kind) => kind.as_str(),
            TypeTag::Array => "array",
            TypeTag::Table => "table",
            TypeTag::PartitionedCollection => "partitioned-collection",
            TypeTag::PartitionedTable => "partitioned-table",
        }
    }

    pub fn category(&self) -> ValueCategory {
        match self {
            TypeTag::Plain(_) => ValueCategory::Plain,
            TypeTag::Array => ValueCategory::Array,
            TypeTag::Table => ValueCategory::Table,
            TypeTag::PartitionedCollection => ValueCategory::PartitionedCollection,
            TypeTag::PartitionedTable => ValueCategory::PartitionedTable,
        }
    }

    /// Partitioned tags must carry `num_partitions`.
    pub fn is_partitioned(&self) -> bool {
        matches!(
            self,
            TypeTag::PartitionedCollection | TypeTag::PartitionedTable
        )
    }
}

impl From<String> for TypeTag {
    fn from(name: String) -> Self {
        match name.as_str() {
            "array" => TypeTag::Array,
            "table" => TypeTag::Table,
            "partitioned-collection" => TypeTag::PartitionedCollection,
            "partitioned-table" => TypeTag::PartitionedTable,
            "none" => TypeTag::Plain(PlainKind::None),
            "bool" => TypeTag::Plain(PlainKind::Bool),
            "int" => TypeTag::Plain(PlainKind::Int),
            "float" => TypeTag::Plain(PlainKind::Float),
            "str" => TypeTag::Plain(PlainKind::Str),
            "list" => TypeTag::Plain(PlainKind::List),
            "tuple" => TypeTag::Plain(PlainKind::Tuple),
            "dict" => TypeTag::Plain(PlainKind::Dict),
            _ => TypeTag::Plain(PlainKind::Other(name)),
        }
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.as_str().to_string()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport-safe envelope: JSON data plus an explicit category tag.
///
/// Wire form: `{"data": ..., "type": "<tag>", "num_partitions": N}` where
/// `num_partitions` is present for partitioned tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedValue {
    pub data: JsonValue,
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_partitions: Option<usize>,
}

impl TaggedValue {
    pub fn new(data: JsonValue, type_tag: TypeTag) -> Self {
        Self {
            data,
            type_tag,
            num_partitions: None,
        }
    }

    pub fn partitioned(data: JsonValue, type_tag: TypeTag, num_partitions: usize) -> Self {
        Self {
            data,
            type_tag,
            num_partitions: Some(num_partitions),
        }
    }

    pub fn category(&self) -> ValueCategory {
        self.type_tag.category()
    }

    /// Serialize to the JSON text sent over the wire.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_form() -> Result<(), serde_json::Error> {
        let tagged = TaggedValue::partitioned(json!([["a", 1]]), TypeTag::PartitionedCollection, 2);
        let text = tagged.to_json_string()?;
        assert_eq!(
            text,
            r#"{"data":[["a",1]],"type":"partitioned-collection","num_partitions":2}"#
        );
        assert_eq!(TaggedValue::from_json_str(&text)?, tagged);
        Ok(())
    }

    #[test]
    fn test_plain_value_omits_partitions() -> Result<(), serde_json::Error> {
        let tagged = TaggedValue::new(json!(3), TypeTag::Plain(PlainKind::Int));
        assert_eq!(tagged.to_json_string()?, r#"{"data":3,"type":"int"}"#);
        Ok(())
    }

    #[test]
    fn test_unknown_tag_preserved() -> Result<(), serde_json::Error> {
        let tagged = TaggedValue::from_json_str(r#"{"data": 1, "type": "decimal"}"#)?;
        assert_eq!(
            tagged.type_tag,
            TypeTag::Plain(PlainKind::Other("decimal".to_string()))
        );
        assert_eq!(tagged.category(), ValueCategory::Plain);
        Ok(())
    }
}
