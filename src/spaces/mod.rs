//! Space implementations: leaf spaces, composite spaces and the closed [`DynSpace`] enum.

pub mod space;
pub mod composite;
pub mod value;
pub mod utils;

use std::fmt;
use std::sync::Arc;

use ndarray::{ArrayD, IxDyn, Zip};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

pub use composite::{DictSpace, TupleSpace};
pub use space::Space;
pub use value::{DType, NdArray, Value};

/// A box in R^n: per-element inclusive bounds `low <= x <= high` of any shape.
/// Bounds are stored as `f64`; `dtype` is the element type of values in the space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxSpace {
    low: ArrayD<f64>,
    high: ArrayD<f64>,
    dtype: DType,
}

impl BoxSpace {
    /// Create a `float32` box from element-wise bounds.
    pub fn new(low: ArrayD<f64>, high: ArrayD<f64>) -> Self {
        assert_eq!(low.shape(), high.shape(), "low and high must have the same shape");
        // NaN bounds are rejected together with low > high
        assert!(
            Zip::from(&low).and(&high).all(|&l, &h| l <= h),
            "low must be <= high element-wise"
        );
        Self { low, high, dtype: DType::F32 }
    }

    /// A `float32` box with the same scalar bounds for every element.
    pub fn uniform(low: f64, high: f64, shape: &[usize]) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(shape), low), ArrayD::from_elem(IxDyn(shape), high))
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn low(&self) -> &ArrayD<f64> { &self.low }
    pub fn high(&self) -> &ArrayD<f64> { &self.high }
    pub fn dtype(&self) -> DType { self.dtype }
    pub fn shape(&self) -> &[usize] { self.low.shape() }

    /// Number of elements.
    pub fn len(&self) -> usize { self.low.len() }

    pub fn is_empty(&self) -> bool { self.low.is_empty() }

    /// Whether every bound is finite.
    pub fn is_bounded(&self) -> bool {
        self.low.iter().chain(self.high.iter()).all(|x| x.is_finite())
    }

    fn sample_element<R: Rng + ?Sized>(&self, l: f64, h: f64, rng: &mut R) -> f64 {
        // Half-open bounds fall back to an exponential tail, fully open ones to [-1, 1]
        let x = match (l.is_finite(), h.is_finite()) {
            (true, true) => Uniform::new_inclusive(l, h).sample(rng),
            (true, false) => l - (1.0 - rng.r#gen::<f64>()).ln(),
            (false, true) => h + (1.0 - rng.r#gen::<f64>()).ln(),
            (false, false) => Uniform::new_inclusive(-1.0, 1.0).sample(rng),
        };
        if self.dtype.is_float() || l.ceil() > h.floor() {
            x
        } else {
            x.floor().clamp(l.ceil(), h.floor())
        }
    }
}

impl Space for BoxSpace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        let mut out = ArrayD::zeros(IxDyn(self.shape()));
        for ((o, &l), &h) in out.iter_mut().zip(self.low.iter()).zip(self.high.iter()) {
            *o = self.sample_element(l, h, rng);
        }
        Value::Array(NdArray::from_f64(out, self.dtype))
    }

    fn contains(&self, value: &Value) -> bool {
        let Value::Array(arr) = value else { return false };
        if arr.shape() != self.shape() { return false; }
        if arr.dtype().is_float() && !self.dtype.is_float() { return false; }
        let x = arr.to_f64();
        Zip::from(&x).and(&self.low).and(&self.high).all(|&v, &l, &h| l <= v && v <= h)
    }
}

/// A discrete space of integers in `[start, start + n)`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Discrete {
    n: u64,
    start: i64,
}

impl Discrete {
    pub fn new(n: u64) -> Self { Self::with_start(n, 0) }

    pub fn with_start(n: u64, start: i64) -> Self {
        assert!(n > 0, "Discrete space requires n > 0");
        Self { n, start }
    }

    pub fn n(&self) -> u64 { self.n }
    pub fn start(&self) -> i64 { self.start }
}

impl Space for Discrete {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        if self.n == 1 { return Value::Discrete(self.start); }
        Value::Discrete(self.start + Uniform::from(0..self.n).sample(rng) as i64)
    }

    fn contains(&self, value: &Value) -> bool {
        match value {
            Value::Discrete(x) => x.checked_sub(self.start).is_some_and(|off| off >= 0 && (off as u64) < self.n),
            _ => false,
        }
    }
}

/// A binary array space of the given shape; elements are `uint8` 0/1 arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiBinary {
    shape: Vec<usize>,
}

impl MultiBinary {
    pub fn new(n: usize) -> Self { Self::with_shape(vec![n]) }

    pub fn with_shape<I: Into<Vec<usize>>>(shape: I) -> Self {
        let shape = shape.into();
        assert!(shape.iter().all(|&d| d > 0), "MultiBinary dimensions must be > 0");
        Self { shape }
    }

    pub fn shape(&self) -> &[usize] { &self.shape }

    pub fn len(&self) -> usize { self.shape.iter().product() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Space for MultiBinary {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        let dist = Uniform::from(0u8..=1u8);
        let data = ArrayD::from_shape_simple_fn(IxDyn(&self.shape), || dist.sample(rng));
        Value::Array(NdArray::U8(data))
    }

    fn contains(&self, value: &Value) -> bool {
        let Value::Array(arr) = value else { return false };
        arr.shape() == self.shape.as_slice() && arr.to_f64().iter().all(|&v| v == 0.0 || v == 1.0)
    }
}

/// A multi-dimensional discrete space; element `i` lies in `[0, nvec[i])`.
/// Elements are 1-d `int64` arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiDiscrete {
    nvec: Vec<u64>,
}

impl MultiDiscrete {
    pub fn new<I: Into<Vec<u64>>>(nvec: I) -> Self {
        let nvec = nvec.into();
        assert!(!nvec.is_empty(), "MultiDiscrete requires at least one dimension");
        for (i, &n) in nvec.iter().enumerate() {
            assert!(n > 0, "MultiDiscrete nvec[{i}] must be > 0");
        }
        Self { nvec }
    }

    pub fn nvec(&self) -> &[u64] { &self.nvec }
    pub fn ndim(&self) -> usize { self.nvec.len() }
}

impl Space for MultiDiscrete {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        let data: Vec<i64> = self
            .nvec
            .iter()
            .map(|&n| if n == 1 { 0 } else { Uniform::from(0..n).sample(rng) as i64 })
            .collect();
        Value::Array(NdArray::I64(ndarray::Array1::from(data).into_dyn()))
    }

    fn contains(&self, value: &Value) -> bool {
        let Value::Array(arr) = value else { return false };
        if arr.shape() != [self.nvec.len()] { return false; }
        arr.to_f64()
            .iter()
            .zip(self.nvec.iter())
            .all(|(&v, &n)| v >= 0.0 && v.fract() == 0.0 && v < n as f64)
    }
}

/// Any space. Leaf kinds never hold children; `Dict` and `Tuple` hold shared child spaces.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DynSpace {
    Box(BoxSpace),
    Discrete(Discrete),
    MultiBinary(MultiBinary),
    MultiDiscrete(MultiDiscrete),
    Dict(DictSpace),
    Tuple(TupleSpace),
}

impl DynSpace {
    /// Name of the space kind, e.g. `Box` or `Dict`.
    pub fn kind(&self) -> &'static str {
        match self {
            DynSpace::Box(_) => "Box",
            DynSpace::Discrete(_) => "Discrete",
            DynSpace::MultiBinary(_) => "MultiBinary",
            DynSpace::MultiDiscrete(_) => "MultiDiscrete",
            DynSpace::Dict(_) => "Dict",
            DynSpace::Tuple(_) => "Tuple",
        }
    }

    /// Shape of elements of a leaf space; `None` for composites.
    pub fn shape(&self) -> Option<Vec<usize>> {
        match self {
            DynSpace::Box(b) => Some(b.shape().to_vec()),
            DynSpace::Discrete(_) => Some(Vec::new()),
            DynSpace::MultiBinary(m) => Some(m.shape().to_vec()),
            DynSpace::MultiDiscrete(m) => Some(vec![m.ndim()]),
            DynSpace::Dict(_) | DynSpace::Tuple(_) => None,
        }
    }

    /// Element type of a leaf space; `None` for composites.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            DynSpace::Box(b) => Some(b.dtype()),
            DynSpace::Discrete(_) | DynSpace::MultiDiscrete(_) => Some(DType::I64),
            DynSpace::MultiBinary(_) => Some(DType::U8),
            DynSpace::Dict(_) | DynSpace::Tuple(_) => None,
        }
    }

    pub fn as_box(&self) -> Option<&BoxSpace> {
        match self {
            DynSpace::Box(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&DictSpace> {
        match self {
            DynSpace::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleSpace> {
        match self {
            DynSpace::Tuple(t) => Some(t),
            _ => None,
        }
    }

    /// Child of a dict space by key.
    pub fn get(&self, key: &str) -> Option<&DynSpace> { self.as_dict()?.get(key) }

    /// Child of a tuple space by position.
    pub fn index(&self, i: usize) -> Option<&DynSpace> { self.as_tuple()?.get(i) }
}

/// Whether the space can contain other spaces (`Dict` or `Tuple`).
pub fn is_nestable(space: &DynSpace) -> bool {
    matches!(space, DynSpace::Dict(_) | DynSpace::Tuple(_))
}

impl Space for DynSpace {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        match self {
            DynSpace::Box(s) => s.sample(rng),
            DynSpace::Discrete(s) => s.sample(rng),
            DynSpace::MultiBinary(s) => s.sample(rng),
            DynSpace::MultiDiscrete(s) => s.sample(rng),
            DynSpace::Dict(s) => s.sample(rng),
            DynSpace::Tuple(s) => s.sample(rng),
        }
    }

    fn contains(&self, value: &Value) -> bool {
        match self {
            DynSpace::Box(s) => s.contains(value),
            DynSpace::Discrete(s) => s.contains(value),
            DynSpace::MultiBinary(s) => s.contains(value),
            DynSpace::MultiDiscrete(s) => s.contains(value),
            DynSpace::Dict(s) => s.contains(value),
            DynSpace::Tuple(s) => s.contains(value),
        }
    }
}

impl From<BoxSpace> for DynSpace { fn from(s: BoxSpace) -> Self { DynSpace::Box(s) } }
impl From<Discrete> for DynSpace { fn from(s: Discrete) -> Self { DynSpace::Discrete(s) } }
impl From<MultiBinary> for DynSpace { fn from(s: MultiBinary) -> Self { DynSpace::MultiBinary(s) } }
impl From<MultiDiscrete> for DynSpace { fn from(s: MultiDiscrete) -> Self { DynSpace::MultiDiscrete(s) } }
impl From<DictSpace> for DynSpace { fn from(s: DictSpace) -> Self { DynSpace::Dict(s) } }
impl From<TupleSpace> for DynSpace { fn from(s: TupleSpace) -> Self { DynSpace::Tuple(s) } }
impl From<Arc<DynSpace>> for DynSpace { fn from(s: Arc<DynSpace>) -> Self { Arc::unwrap_or_clone(s) } }

pub(crate) fn fmt_shape(shape: &[usize]) -> String {
    match shape {
        [d] => format!("({d},)"),
        _ => format!(
            "({})",
            shape.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn fmt_bound(bound: &ArrayD<f64>) -> String {
    match bound.iter().next() {
        Some(first) if bound.iter().all(|x| x == first) => format!("{first:?}"),
        _ => format!("{bound}"),
    }
}

impl fmt::Display for BoxSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Box({}, {}, {}, {})",
            fmt_bound(&self.low),
            fmt_bound(&self.high),
            fmt_shape(self.shape()),
            self.dtype
        )
    }
}

impl fmt::Display for DynSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynSpace::Box(b) => write!(f, "{b}"),
            DynSpace::Discrete(d) if d.start() == 0 => write!(f, "Discrete({})", d.n()),
            DynSpace::Discrete(d) => write!(f, "Discrete({}, start={})", d.n(), d.start()),
            DynSpace::MultiBinary(m) => write!(f, "MultiBinary({})", fmt_shape(m.shape())),
            DynSpace::MultiDiscrete(m) => write!(f, "MultiDiscrete({:?})", m.nvec()),
            DynSpace::Dict(d) => {
                f.write_str("Dict(")?;
                for (i, (k, s)) in d.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{k}: {s}")?;
                }
                f.write_str(")")
            }
            DynSpace::Tuple(t) => {
                f.write_str("Tuple(")?;
                for (i, s) in t.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{s}")?;
                }
                f.write_str(")")
            }
        }
    }
}
