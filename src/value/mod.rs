//! Dynamic values exchanged between test bundles, submissions and the grader.
//!
//! A [`Value`] is a closed sum type covering every category the harness
//! knows how to serialize and compare. Callers never inspect runtime type
//! identity: [`Value::category`] names the branch explicitly.
//!
//! Exact equality is structural with a few deliberate relaxations so that
//! values survive a JSON round trip:
//!
//! - `Int` and `Float` compare numerically (`1 == 1.0`)
//! - `NaN == NaN` and `-0.0 == 0.0`
//! - `List` and `Tuple` with equal items compare equal
//!
//! [`Ord`] and [`Hash`] are consistent with that equality, so values can be
//! used as grouping keys and sorted.

mod array;
mod error;
mod table;

pub use array::{DType, NdArray};
pub use error::ShapeError;
pub use table::Table;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::dataset::{DataFrame, Dataset};

/// Category of a value, used to select encode/decode and comparison branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    /// Scalars, strings, lists, tuples and dictionaries.
    Plain,
    /// N-dimensional numeric array.
    Array,
    /// Tabular frame with named columns.
    Table,
    /// Key/value records distributed across partitions.
    PartitionedCollection,
    /// Tabular rows distributed across partitions.
    PartitionedTable,
}

impl fmt::Display for ValueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueCategory::Plain => "plain",
            ValueCategory::Array => "array",
            ValueCategory::Table => "table",
            ValueCategory::PartitionedCollection => "partitioned-collection",
            ValueCategory::PartitionedTable => "partitioned-table",
        };
        f.write_str(name)
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(BTreeMap<String, Value>),
    Array(NdArray),
    Table(Table),
    Collection(Dataset),
    Frame(DataFrame),
}

impl Value {
    /// Build a `(key, value)` tuple.
    pub fn pair(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Value::Tuple(vec![key.into(), value.into()])
    }

    pub fn category(&self) -> ValueCategory {
        match self {
            Value::Array(_) => ValueCategory::Array,
            Value::Table(_) => ValueCategory::Table,
            Value::Collection(_) => ValueCategory::PartitionedCollection,
            Value::Frame(_) => ValueCategory::PartitionedTable,
            _ => ValueCategory::Plain,
        }
    }

    /// Short name of the variant, used in error messages and plain type tags.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Array(_) => "array",
            Value::Table(_) => "table",
            Value::Collection(_) => "partitioned-collection",
            Value::Frame(_) => "partitioned-table",
        }
    }

    /// `Int` or `Float`. Booleans are not numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of `Int` and `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a `List` or `Tuple`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dict(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Dataset> {
        match self {
            Value::Collection(dataset) => Some(dataset),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&DataFrame> {
        match self {
            Value::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Split a two-item `List`/`Tuple` into its key and value.
    pub fn as_pair(&self) -> Option<(&Value, &Value)> {
        match self.as_list()? {
            [key, value] => Some((key, value)),
            _ => None,
        }
    }

    /// Rank of the variant in the total order. Numbers share a rank, as do
    /// lists and tuples.
    fn rank(&self) -> u8 {
        match self {
            Value::None => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::List(_) | Value::Tuple(_) => 4,
            Value::Dict(_) => 5,
            Value::Array(_) => 6,
            Value::Table(_) => 7,
            Value::Collection(_) => 8,
            Value::Frame(_) => 9,
        }
    }
}

/// Total order over floats that agrees with `==` except that NaN equals NaN
/// and sorts above every number.
pub(crate) fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Bit pattern used for hashing non-integral floats; zeros and NaNs are
/// canonicalized.
pub(crate) fn float_hash_bits(f: f64) -> u64 {
    if f == 0.0 {
        0
    } else if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

/// Integral floats inside the `i64` range hash like the equal integer.
fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Exact order between an integer and a float. No rounding of the integer
/// takes place, so the order stays transitive above 2^53.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float above every i64.
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() || f >= I64_END {
        return Ordering::Less;
    }
    if f < -I64_END {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    // `whole` lies in [-2^63, 2^63), so the cast is exact.
    i.cmp(&(whole as i64)).then_with(|| cmp_f64(whole, f))
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::None, Value::None) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => cmp_int_float(*a, *b),
            (Value::Float(a), Value::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Value::Float(a), Value::Float(b)) => cmp_f64(*a, *b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (
                Value::List(a) | Value::Tuple(a),
                Value::List(b) | Value::Tuple(b),
            ) => a.iter().cmp(b.iter()),
            (Value::Dict(a), Value::Dict(b)) => a.iter().cmp(b.iter()),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Table(a), Value::Table(b)) => a.cmp(b),
            (Value::Collection(a), Value::Collection(b)) => a.cmp(b),
            (Value::Frame(a), Value::Frame(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::None => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => {
                false.hash(state);
                i.hash(state);
            }
            Value::Float(f) => match integral(*f) {
                Some(i) => {
                    false.hash(state);
                    i.hash(state);
                }
                None => {
                    true.hash(state);
                    float_hash_bits(*f).hash(state);
                }
            },
            Value::Str(s) => s.hash(state),
            Value::List(items) | Value::Tuple(items) => items.hash(state),
            Value::Dict(map) => map.hash(state),
            Value::Array(array) => array.hash(state),
            Value::Table(table) => table.hash(state),
            Value::Collection(dataset) => dataset.hash(state),
            Value::Frame(frame) => frame.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::List(items) => write_seq(f, "[", items, "]"),
            Value::Tuple(items) => write_seq(f, "(", items, ")"),
            Value::Dict(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Value::Array(array) => write!(f, "array(shape={:?})", array.shape()),
            Value::Table(table) => write!(
                f,
                "table({} rows x {} columns)",
                table.num_rows(),
                table.columns().len()
            ),
            Value::Collection(dataset) => write!(
                f,
                "collection({} partitions)",
                dataset.num_partitions()
            ),
            Value::Frame(frame) => write!(f, "frame({} partitions)", frame.num_partitions()),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<NdArray> for Value {
    fn from(array: NdArray) -> Self {
        Value::Array(array)
    }
}

impl From<Table> for Value {
    fn from(table: Table) -> Self {
        Value::Table(table)
    }
}

impl From<Dataset> for Value {
    fn from(dataset: Dataset) -> Self {
        Value::Collection(dataset)
    }
}

impl From<DataFrame> for Value {
    fn from(frame: DataFrame) -> Self {
        Value::Frame(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_int_float_numeric_equality() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::Float(1.5));
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn test_int_float_exact_above_2_pow_53() {
        let big = 1i64 << 53;
        let float = Value::Float(big as f64);
        assert_eq!(Value::Int(big), float);
        assert_ne!(Value::Int(big + 1), float);
        assert!(Value::Int(big + 1) > float);
        assert!(float < Value::Int(big + 1));
        assert!(Value::Int(i64::MAX) < Value::Float(9_223_372_036_854_775_808.0));
        assert!(Value::Int(i64::MIN) == Value::Float(i64::MIN as f64));
        assert!(Value::Int(-3) > Value::Float(-3.5));
        assert!(Value::Int(3) < Value::Float(3.5));
        assert!(Value::Int(0) < Value::Float(f64::NAN));
        assert!(Value::Int(i64::MIN) > Value::Float(f64::NEG_INFINITY));

        let keys: HashSet<Value> = [Value::Int(big + 1)].into_iter().collect();
        assert!(!keys.contains(&float));
        assert!(keys.contains(&Value::Int(big + 1)));
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        let mut set = HashSet::new();
        set.insert(Value::Int(3));
        assert!(set.contains(&Value::Float(3.0)));
        set.insert(Value::Float(-0.0));
        assert!(set.contains(&Value::Int(0)));
        set.insert(Value::Float(f64::NAN));
        assert!(set.contains(&Value::Float(f64::NAN)));
    }

    #[test]
    fn test_list_and_tuple_compare_equal() {
        let list = Value::List(vec![Value::from("a"), Value::Int(1)]);
        let tuple = Value::pair("a", 1);
        assert_eq!(list, tuple);
        assert_eq!(tuple.as_pair().map(|(k, _)| k.clone()), Some(Value::from("a")));
    }

    #[test]
    fn test_total_order_across_variants() {
        let mut values = vec![
            Value::from("b"),
            Value::Int(2),
            Value::None,
            Value::Float(1.5),
            Value::Bool(true),
            Value::from("a"),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::None,
                Value::Bool(true),
                Value::Float(1.5),
                Value::Int(2),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_category() {
        assert_eq!(Value::Int(1).category(), ValueCategory::Plain);
        assert_eq!(
            Value::Array(NdArray::from_f64(vec![1.0])).category(),
            ValueCategory::Array
        );
        assert!(!Value::Bool(true).is_numeric());
    }
}
