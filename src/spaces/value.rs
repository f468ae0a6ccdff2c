//! Runtime values living in spaces: typed n-d arrays, discrete integers and nested containers.

use std::fmt;

use ndarray::{Array1, ArrayD, IxDyn};

use crate::core::{GymError, Result};

/// Element type of an array-valued space or value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DType {
    F32,
    F64,
    I32,
    I64,
    U8,
}

impl DType {
    pub fn is_float(self) -> bool { matches!(self, DType::F32 | DType::F64) }

    /// Smallest representable value, as f64.
    pub fn min_value(self) -> f64 {
        match self {
            DType::F32 => f32::MIN as f64,
            DType::F64 => f64::MIN,
            DType::I32 => i32::MIN as f64,
            DType::I64 => i64::MIN as f64,
            DType::U8 => 0.0,
        }
    }

    /// Largest representable value, as f64.
    pub fn max_value(self) -> f64 {
        match self {
            DType::F32 => f32::MAX as f64,
            DType::F64 => f64::MAX,
            DType::I32 => i32::MAX as f64,
            DType::I64 => i64::MAX as f64,
            DType::U8 => u8::MAX as f64,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F32 => "float32",
            DType::F64 => "float64",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::U8 => "uint8",
        };
        f.write_str(name)
    }
}

/// A dynamically-shaped array tagged with its element type.
///
/// Arithmetic in transforms is done in `f64` through [`NdArray::to_f64`] and converted back
/// with [`NdArray::from_f64`], so the dtype of a value survives clipping and rescaling.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NdArray {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    U8(ArrayD<u8>),
}

impl NdArray {
    pub fn dtype(&self) -> DType {
        match self {
            NdArray::F32(_) => DType::F32,
            NdArray::F64(_) => DType::F64,
            NdArray::I32(_) => DType::I32,
            NdArray::I64(_) => DType::I64,
            NdArray::U8(_) => DType::U8,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            NdArray::F32(a) => a.shape(),
            NdArray::F64(a) => a.shape(),
            NdArray::I32(a) => a.shape(),
            NdArray::I64(a) => a.shape(),
            NdArray::U8(a) => a.shape(),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize { self.shape().iter().product() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Copy the elements into an `f64` array of the same shape.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            NdArray::F32(a) => a.mapv(|x| x as f64),
            NdArray::F64(a) => a.clone(),
            NdArray::I32(a) => a.mapv(|x| x as f64),
            NdArray::I64(a) => a.mapv(|x| x as f64),
            NdArray::U8(a) => a.mapv(|x| x as f64),
        }
    }

    /// Build an array of `dtype` from `f64` data. Integer targets truncate toward zero and
    /// saturate at the dtype's range.
    pub fn from_f64(data: ArrayD<f64>, dtype: DType) -> Self {
        match dtype {
            DType::F32 => NdArray::F32(data.mapv(|x| x as f32)),
            DType::F64 => NdArray::F64(data),
            DType::I32 => NdArray::I32(data.mapv(|x| x as i32)),
            DType::I64 => NdArray::I64(data.mapv(|x| x as i64)),
            DType::U8 => NdArray::U8(data.mapv(|x| x as u8)),
        }
    }

    /// Convert to another element type.
    pub fn cast(&self, dtype: DType) -> Self {
        if self.dtype() == dtype {
            return self.clone();
        }
        Self::from_f64(self.to_f64(), dtype)
    }

    /// Apply an element-wise `f64` function, keeping the dtype.
    pub fn map_f64(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::from_f64(self.to_f64().mapv(f), self.dtype())
    }

    /// Reshape to `shape`; the element count must be unchanged.
    pub fn into_shape(self, shape: &[usize]) -> Result<Self> {
        Ok(match self {
            NdArray::F32(a) => NdArray::F32(reshape_array(a, shape)?),
            NdArray::F64(a) => NdArray::F64(reshape_array(a, shape)?),
            NdArray::I32(a) => NdArray::I32(reshape_array(a, shape)?),
            NdArray::I64(a) => NdArray::I64(reshape_array(a, shape)?),
            NdArray::U8(a) => NdArray::U8(reshape_array(a, shape)?),
        })
    }
}

/// Reshape an owned array in row-major order.
pub(crate) fn reshape_array<T: Clone>(a: ArrayD<T>, shape: &[usize]) -> Result<ArrayD<T>> {
    let from = a.shape().to_vec();
    let a = if a.is_standard_layout() { a } else { a.as_standard_layout().into_owned() };
    a.into_shape(IxDyn(shape)).map_err(|_| {
        GymError::ShapeMismatch(format!("cannot reshape array of shape {from:?} into shape {shape:?}"))
    })
}

/// A value belonging to a space: the runtime counterpart of [`crate::spaces::DynSpace`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Element of a Box, MultiBinary or MultiDiscrete space.
    Array(NdArray),
    /// Element of a Discrete space.
    Discrete(i64),
    /// Element of a Dict space, in the space's key order.
    Dict(Vec<(String, Value)>),
    /// Element of a Tuple space.
    Tuple(Vec<Value>),
}

impl Value {
    /// Build a dict value from `(key, value)` pairs.
    pub fn dict<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn tuple<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    /// A 1-d `float32` array.
    pub fn f32s(values: &[f32]) -> Self {
        Value::Array(NdArray::F32(Array1::from(values.to_vec()).into_dyn()))
    }

    /// A 1-d `float64` array.
    pub fn f64s(values: &[f64]) -> Self {
        Value::Array(NdArray::F64(Array1::from(values.to_vec()).into_dyn()))
    }

    /// Look up a child of a dict value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up a child of a tuple value.
    pub fn index(&self, i: usize) -> Option<&Value> {
        match self {
            Value::Tuple(items) => items.get(i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_discrete(&self) -> Option<i64> {
        match self {
            Value::Discrete(x) => Some(*x),
            _ => None,
        }
    }

    /// Element-wise `f64` view of an array value.
    pub fn to_f64(&self) -> Option<ArrayD<f64>> { self.as_array().map(NdArray::to_f64) }

    /// Short description of what kind of value this is, e.g. `ndarray[float32]` or `dict`.
    pub fn kind(&self) -> String {
        match self {
            Value::Array(a) => format!("ndarray[{}]", a.dtype()),
            Value::Discrete(_) => "int".to_string(),
            Value::Dict(_) => "dict".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Array(a) => write!(f, "{}", a.to_f64()),
            Value::Discrete(x) => write!(f, "{x}"),
            Value::Dict(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<NdArray> for Value { fn from(a: NdArray) -> Self { Value::Array(a) } }
impl From<ArrayD<f32>> for Value { fn from(a: ArrayD<f32>) -> Self { Value::Array(NdArray::F32(a)) } }
impl From<ArrayD<f64>> for Value { fn from(a: ArrayD<f64>) -> Self { Value::Array(NdArray::F64(a)) } }
impl From<ArrayD<i32>> for Value { fn from(a: ArrayD<i32>) -> Self { Value::Array(NdArray::I32(a)) } }
impl From<ArrayD<i64>> for Value { fn from(a: ArrayD<i64>) -> Self { Value::Array(NdArray::I64(a)) } }
impl From<ArrayD<u8>> for Value { fn from(a: ArrayD<u8>) -> Self { Value::Array(NdArray::U8(a)) } }
impl From<i64> for Value { fn from(x: i64) -> Self { Value::Discrete(x) } }

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn cast_truncates_and_saturates() {
        let a = NdArray::F64(arr1(&[1.7, -2.5, 300.0]).into_dyn());
        assert_eq!(a.cast(DType::I32), NdArray::I32(arr1(&[1, -2, 300]).into_dyn()));
        assert_eq!(a.cast(DType::U8), NdArray::U8(arr1(&[1, 0, 255]).into_dyn()));
    }

    #[test]
    fn map_keeps_dtype() {
        let a = NdArray::F32(arr1(&[1.0f32, 2.0]).into_dyn());
        let b = a.map_f64(|x| x * 2.0);
        assert_eq!(b.dtype(), DType::F32);
        assert_eq!(b, NdArray::F32(arr1(&[2.0f32, 4.0]).into_dyn()));
    }

    #[test]
    fn into_shape_checks_element_count() {
        let a = NdArray::U8(ArrayD::zeros(IxDyn(&[4, 6])));
        assert_eq!(a.clone().into_shape(&[2, 12]).unwrap().shape(), &[2, 12]);
        assert!(matches!(a.into_shape(&[5, 5]), Err(GymError::ShapeMismatch(_))));
    }

    #[test]
    fn dict_lookup_and_kind() {
        let v = Value::dict([("a", Value::Discrete(3)), ("b", Value::f32s(&[0.5]))]);
        assert_eq!(v.get("a"), Some(&Value::Discrete(3)));
        assert!(v.get("c").is_none());
        assert_eq!(v.get("b").unwrap().kind(), "ndarray[float32]");
        assert_eq!(v.kind(), "dict");
    }
}
