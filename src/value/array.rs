//! Dense n-dimensional numeric arrays.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use super::error::ShapeError;
use super::{Value, cmp_f64, float_hash_bits};

/// Element type of an [`NdArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Int,
    Float,
}

/// Row-major n-dimensional array of numbers.
///
/// Integers are stored as `f64`; `dtype` records whether the array should
/// round-trip as integers. Equality ignores `dtype`, mirroring the numeric
/// equality of [`Value`].
#[derive(Debug, Clone)]
pub struct NdArray {
    shape: Vec<usize>,
    data: Vec<f64>,
    dtype: DType,
}

impl NdArray {
    /// Build an array from a shape and row-major data.
    pub fn new(shape: Vec<usize>, data: Vec<f64>, dtype: DType) -> Result<Self, ShapeError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(ShapeError::ElementCount {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(Self { shape, data, dtype })
    }

    /// One-dimensional float array.
    pub fn from_f64(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
            dtype: DType::Float,
        }
    }

    /// One-dimensional integer array.
    pub fn from_i64(data: Vec<i64>) -> Self {
        Self {
            shape: vec![data.len()],
            data: data.into_iter().map(|i| i as f64).collect(),
            dtype: DType::Int,
        }
    }

    /// Materialize an array from nested lists of numbers.
    ///
    /// A bare number becomes a zero-dimensional array. Booleans count as
    /// integers. The array is `Float` as soon as one element is a float.
    pub fn from_nested(value: &Value) -> Result<Self, ShapeError> {
        let mut builder = Builder::default();
        builder.visit(value, 0)?;
        Ok(Self {
            shape: builder.shape,
            data: builder.data,
            dtype: if builder.saw_float { DType::Float } else { DType::Int },
        })
    }

    /// Render the array as nested lists of `Int`/`Float` values.
    pub fn to_nested(&self) -> Value {
        nest(&self.shape, &self.data, self.dtype)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Default)]
struct Builder {
    shape: Vec<usize>,
    leaf_depth: Option<usize>,
    data: Vec<f64>,
    saw_float: bool,
}

impl Builder {
    fn visit(&mut self, value: &Value, depth: usize) -> Result<(), ShapeError> {
        match value {
            Value::List(items) | Value::Tuple(items) => {
                if self.leaf_depth.is_some_and(|leaf| leaf <= depth) {
                    return Err(ShapeError::Ragged);
                }
                match self.shape.get(depth) {
                    Some(&len) if len != items.len() => return Err(ShapeError::Ragged),
                    Some(_) => {}
                    None => self.shape.push(items.len()),
                }
                for item in items {
                    self.visit(item, depth + 1)?;
                }
                Ok(())
            }
            Value::Int(i) => self.leaf(depth, *i as f64),
            Value::Bool(b) => self.leaf(depth, if *b { 1.0 } else { 0.0 }),
            Value::Float(f) => {
                self.saw_float = true;
                self.leaf(depth, *f)
            }
            other => Err(ShapeError::NonNumeric(other.type_name().to_string())),
        }
    }

    fn leaf(&mut self, depth: usize, x: f64) -> Result<(), ShapeError> {
        match self.leaf_depth {
            Some(leaf) if leaf != depth => return Err(ShapeError::Ragged),
            Some(_) => {}
            None => {
                // A deeper level was already recorded by an earlier sibling.
                if depth != self.shape.len() {
                    return Err(ShapeError::Ragged);
                }
                self.leaf_depth = Some(depth);
            }
        }
        self.data.push(x);
        Ok(())
    }
}

fn scalar(x: f64, dtype: DType) -> Value {
    match dtype {
        DType::Int => Value::Int(x as i64),
        DType::Float => Value::Float(x),
    }
}

fn nest(shape: &[usize], data: &[f64], dtype: DType) -> Value {
    match shape.split_first() {
        None => data
            .first()
            .map(|x| scalar(*x, dtype))
            .unwrap_or(Value::None),
        Some((&len, rest)) => {
            let stride: usize = rest.iter().product();
            let items = (0..len)
                .map(|i| {
                    let chunk = data.get(i * stride..(i + 1) * stride).unwrap_or(&[]);
                    nest(rest, chunk, dtype)
                })
                .collect();
            Value::List(items)
        }
    }
}

impl Ord for NdArray {
    fn cmp(&self, other: &Self) -> Ordering {
        self.shape.cmp(&other.shape).then_with(|| {
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| cmp_f64(*a, *b))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| self.data.len().cmp(&other.data.len()))
        })
    }
}

impl PartialOrd for NdArray {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NdArray {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NdArray {}

impl Hash for NdArray {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shape.hash(state);
        for x in &self.data {
            float_hash_bits(*x).hash(state);
        }
    }
}
