//! Space utilities: applying a leaf function across a value tree, and flattening.

use ndarray::{Array1, ArrayD, IxDyn};

use super::{BoxSpace, DType, DynSpace, NdArray, Value};
use crate::core::{GymError, Result};
use crate::transform::{ArgTree, Level, index_path, key_path, level};

/// Arguments resolved for one node of the value walk.
enum Node<'a, L> {
    Leaf(Option<&'a L>),
    Children(Vec<Option<&'a ArgTree<L>>>),
}

fn node<'a, L>(space: &'a DynSpace, args: Option<&'a ArgTree<L>>, path: &str) -> Result<Node<'a, L>> {
    let lvl = match args {
        Some(args) => level(space, args, path)?,
        None => Level::Unset,
    };
    Ok(match lvl {
        Level::Leaf(arg) => Node::Leaf(Some(arg)),
        Level::Dict(_, per_key) => Node::Children(per_key),
        Level::Tuple(_, items) => Node::Children(items.into_iter().map(Some).collect()),
        Level::Unset => match space {
            DynSpace::Dict(d) => Node::Children(vec![None; d.len()]),
            DynSpace::Tuple(t) => Node::Children(vec![None; t.len()]),
            _ => Node::Leaf(None),
        },
    })
}

/// Apply `f` to every leaf of `value`, a value of `space`, passing the leaf's argument from
/// `args` (`None` where the tree is unset).
///
/// Dict values are rebuilt in the space's key order. A value whose structure does not match
/// `space` is [`GymError::InvalidValue`]; an argument tree that does not match it is
/// [`GymError::ShapeMismatch`].
pub fn apply_function<L, F>(space: &DynSpace, value: Value, f: &F, args: &ArgTree<L>) -> Result<Value>
where
    F: Fn(Value, Option<&L>) -> Result<Value>,
{
    apply_at(space, value, f, Some(args), "root")
}

fn apply_at<L, F>(space: &DynSpace, value: Value, f: &F, args: Option<&ArgTree<L>>, path: &str) -> Result<Value>
where
    F: Fn(Value, Option<&L>) -> Result<Value>,
{
    let children = match node(space, args, path)? {
        Node::Leaf(arg) => return f(value, arg),
        Node::Children(children) => children,
    };
    match (space, value) {
        (DynSpace::Dict(dict), Value::Dict(mut entries)) => {
            if entries.len() != dict.len() {
                return Err(GymError::InvalidValue(format!(
                    "dict value at {path} has {} entries, space {space} has {}",
                    entries.len(),
                    dict.len()
                )));
            }
            let mut out = Vec::with_capacity(dict.len());
            for ((k, child), arg) in dict.iter().zip(children) {
                let pos = entries.iter().position(|(key, _)| key == k).ok_or_else(|| {
                    GymError::InvalidValue(format!("dict value at {path} is missing key `{k}`"))
                })?;
                let (key, v) = entries.swap_remove(pos);
                out.push((key, apply_at(child, v, f, arg, &key_path(path, k))?));
            }
            Ok(Value::Dict(out))
        }
        (DynSpace::Tuple(tuple), Value::Tuple(items)) => {
            if items.len() != tuple.len() {
                return Err(GymError::InvalidValue(format!(
                    "tuple value at {path} has {} items, space {space} has {}",
                    items.len(),
                    tuple.len()
                )));
            }
            tuple
                .iter()
                .zip(items)
                .zip(children)
                .enumerate()
                .map(|(i, ((child, v), arg))| apply_at(child, v, f, arg, &index_path(path, i)))
                .collect::<Result<Vec<_>>>()
                .map(Value::Tuple)
        }
        (_, other) => Err(GymError::InvalidValue(format!(
            "value of kind {} at {path} does not match space {space}",
            other.kind()
        ))),
    }
}

/// Number of elements of the flattened form of `space`.
pub fn flatdim(space: &DynSpace) -> usize {
    match space {
        DynSpace::Box(b) => b.len(),
        DynSpace::Discrete(d) => d.n() as usize,
        DynSpace::MultiBinary(m) => m.len(),
        DynSpace::MultiDiscrete(m) => m.nvec().iter().map(|&n| n as usize).sum(),
        DynSpace::Dict(d) => d.iter().map(|(_, s)| flatdim(s)).sum(),
        DynSpace::Tuple(t) => t.iter().map(flatdim).sum(),
    }
}

/// Element type of a concatenation of `a` and `b`.
fn promote(a: DType, b: DType) -> DType {
    use DType::*;
    match (a, b) {
        (x, y) if x == y => x,
        (F64, _) | (_, F64) => F64,
        (F32, U8) | (U8, F32) => F32,
        (F32, _) | (_, F32) => F64,
        (I64, _) | (_, I64) => I64,
        _ => I32,
    }
}

fn flat_dtype(space: &DynSpace) -> Option<DType> {
    match space {
        DynSpace::Dict(d) => d.iter().filter_map(|(_, s)| flat_dtype(s)).reduce(promote),
        DynSpace::Tuple(t) => t.iter().filter_map(flat_dtype).reduce(promote),
        leaf => leaf.dtype(),
    }
}

/// The 1-d Box that [`flatten`] maps values of `space` into.
pub fn flatten_space(space: &DynSpace) -> Result<BoxSpace> {
    let n = flatdim(space);
    let mut low = Vec::with_capacity(n);
    let mut high = Vec::with_capacity(n);
    push_bounds(space, &mut low, &mut high);
    let dtype = flat_dtype(space).unwrap_or(DType::F32);
    Ok(BoxSpace::new(Array1::from(low).into_dyn(), Array1::from(high).into_dyn()).with_dtype(dtype))
}

fn push_bounds(space: &DynSpace, low: &mut Vec<f64>, high: &mut Vec<f64>) {
    match space {
        DynSpace::Box(b) => {
            low.extend(b.low().iter());
            high.extend(b.high().iter());
        }
        DynSpace::Dict(d) => d.iter().for_each(|(_, s)| push_bounds(s, low, high)),
        DynSpace::Tuple(t) => t.iter().for_each(|s| push_bounds(s, low, high)),
        other => {
            let n = flatdim(other);
            low.extend(std::iter::repeat(0.0).take(n));
            high.extend(std::iter::repeat(1.0).take(n));
        }
    }
}

/// Flatten `value`, a value of `space`, into a 1-d array of [`flatten_space`]'s dtype.
///
/// Discrete values become one-hot vectors and MultiDiscrete values concatenated one-hots.
pub fn flatten(space: &DynSpace, value: &Value) -> Result<Value> {
    let mut buf = Vec::with_capacity(flatdim(space));
    flatten_into(space, value, &mut buf, "root")?;
    let dtype = flat_dtype(space).unwrap_or(DType::F32);
    let n = buf.len();
    let data = ArrayD::from_shape_vec(IxDyn(&[n]), buf)
        .map_err(|e| GymError::ShapeMismatch(format!("cannot flatten into {n} elements: {e}")))?;
    Ok(Value::Array(NdArray::from_f64(data, dtype)))
}

fn mismatch(space: &DynSpace, value: &Value, path: &str) -> GymError {
    GymError::InvalidValue(format!(
        "value of kind {} at {path} does not match space {space}",
        value.kind()
    ))
}

fn one_hot(buf: &mut Vec<f64>, index: i64, n: u64, path: &str) -> Result<()> {
    if index < 0 || index as u64 >= n {
        return Err(GymError::InvalidValue(format!("index {index} at {path} is outside [0, {n})")));
    }
    let start = buf.len();
    buf.extend(std::iter::repeat(0.0).take(n as usize));
    buf[start + index as usize] = 1.0;
    Ok(())
}

fn flatten_into(space: &DynSpace, value: &Value, buf: &mut Vec<f64>, path: &str) -> Result<()> {
    match (space, value) {
        (DynSpace::Discrete(d), Value::Discrete(x)) => one_hot(buf, x - d.start(), d.n(), path),
        (DynSpace::MultiDiscrete(m), Value::Array(arr)) if arr.shape() == [m.ndim()] => {
            for (&x, &n) in arr.to_f64().iter().zip(m.nvec()) {
                one_hot(buf, x as i64, n, path)?;
            }
            Ok(())
        }
        (DynSpace::Box(_) | DynSpace::MultiBinary(_), Value::Array(arr)) => {
            let expected = space.shape().unwrap_or_default();
            if arr.shape() != expected.as_slice() {
                return Err(mismatch(space, value, path));
            }
            buf.extend(arr.to_f64().iter());
            Ok(())
        }
        (DynSpace::Dict(dict), Value::Dict(_)) => {
            for (k, child) in dict.iter() {
                let v = value
                    .get(k)
                    .ok_or_else(|| GymError::InvalidValue(format!("dict value at {path} is missing key `{k}`")))?;
                flatten_into(child, v, buf, &key_path(path, k))?;
            }
            Ok(())
        }
        (DynSpace::Tuple(tuple), Value::Tuple(items)) if items.len() == tuple.len() => {
            for (i, (child, v)) in tuple.iter().zip(items).enumerate() {
                flatten_into(child, v, buf, &index_path(path, i))?;
            }
            Ok(())
        }
        _ => Err(mismatch(space, value, path)),
    }
}
