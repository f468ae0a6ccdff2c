//! Bound rewriting for Box leaves: new bounds for `clip`, and original-plus-new bounds for
//! `rescale`.

use ndarray::{ArrayD, IxDyn, Zip};

use super::{ArgTree, map_args, transform_space};
use crate::core::{GymError, Result};
use crate::spaces::{BoxSpace, DynSpace, NdArray, Value};

/// New `(low, high)` bounds for a Box leaf. Each bound is a scalar (0-d array) or an array that
/// broadcasts to the leaf's shape.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub low: ArrayD<f64>,
    pub high: ArrayD<f64>,
}

impl Bounds {
    /// Scalar bounds applied to every element.
    pub fn new(low: f64, high: f64) -> Self {
        Self { low: ArrayD::from_elem(IxDyn(&[]), low), high: ArrayD::from_elem(IxDyn(&[]), high) }
    }

    pub fn from_arrays(low: ArrayD<f64>, high: ArrayD<f64>) -> Self { Self { low, high } }

    /// Broadcast both bounds to `shape`.
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<(ArrayD<f64>, ArrayD<f64>)> {
        Ok((broadcast(&self.low, shape)?, broadcast(&self.high, shape)?))
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((low, high): (f64, f64)) -> Self { Self::new(low, high) }
}

/// Bounds needed to map a value from a rewritten Box back onto the original one.
/// All four arrays have the shape of the original leaf.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RescaleArgs {
    pub new_low: ArrayD<f64>,
    pub new_high: ArrayD<f64>,
    pub low: ArrayD<f64>,
    pub high: ArrayD<f64>,
}

fn broadcast(bound: &ArrayD<f64>, shape: &[usize]) -> Result<ArrayD<f64>> {
    bound.broadcast(IxDyn(shape)).map(|v| v.to_owned()).ok_or_else(|| {
        GymError::ShapeMismatch(format!(
            "bound of shape {:?} cannot be broadcast to shape {shape:?}",
            bound.shape()
        ))
    })
}

fn require_box<'a>(space: &'a DynSpace, op: &str) -> Result<&'a BoxSpace> {
    space.as_box().ok_or_else(|| {
        GymError::InvalidSpaceOperation(format!("cannot {op} a {} space ({space})", space.kind()))
    })
}

fn check_ordered(low: &ArrayD<f64>, high: &ArrayD<f64>, strict: bool) -> Result<()> {
    let ok = Zip::from(low).and(high).all(|&l, &h| if strict { l < h } else { l <= h });
    if ok {
        Ok(())
    } else {
        Err(GymError::InvalidBound(format!("low {low} must be below high {high}")))
    }
}

/// Replace the bounds of a Box leaf, keeping its shape and dtype.
pub fn box_with_bounds(space: &DynSpace, bounds: &Bounds) -> Result<DynSpace> {
    let b = require_box(space, "rewrite the bounds of")?;
    let (low, high) = bounds.broadcast_to(b.shape())?;
    check_ordered(&low, &high, false)?;
    Ok(BoxSpace::new(low, high).with_dtype(b.dtype()).into())
}

/// Rewrite the bounds of every Box leaf that has an argument.
///
/// A non-Box leaf with an argument is rejected with `InvalidSpaceOperation` rather than passed
/// through unchanged.
pub fn transform_space_bounds(space: &DynSpace, args: &ArgTree<Bounds>) -> Result<DynSpace> {
    transform_space(space, args, &box_with_bounds)
}

/// Extend every `(new_low, new_high)` leaf with the original leaf's `(low, high)`.
///
/// Fails with `ShapeMismatch` when new bounds do not broadcast to the leaf shape and with
/// `InvalidBound` when the new range is empty or the original range is unbounded, since the
/// affine map between the two would be undefined.
pub fn extend_args(space: &DynSpace, args: &ArgTree<Bounds>) -> Result<ArgTree<RescaleArgs>> {
    map_args(space, args, &|leaf: &DynSpace, bounds: &Bounds| -> Result<RescaleArgs> {
        let b = require_box(leaf, "rescale")?;
        let (new_low, new_high) = bounds.broadcast_to(b.shape())?;
        check_ordered(&new_low, &new_high, true)?;
        if !b.is_bounded() {
            return Err(GymError::InvalidBound(format!("cannot rescale unbounded space {b}")));
        }
        Ok(RescaleArgs { new_low, new_high, low: b.low().clone(), high: b.high().clone() })
    })
}

fn require_array(value: Value, op: &str) -> Result<NdArray> {
    match value {
        Value::Array(a) => Ok(a),
        other => Err(GymError::InvalidValue(format!("cannot {op} a value of kind {}: {other}", other.kind()))),
    }
}

/// Clip an array value into `bounds`. `None` leaves the value untouched.
pub fn clip(value: Value, bounds: Option<&Bounds>) -> Result<Value> {
    let Some(bounds) = bounds else { return Ok(value) };
    let arr = require_array(value, "clip")?;
    let (low, high) = bounds.broadcast_to(arr.shape())?;
    let mut x = arr.to_f64();
    Zip::from(&mut x).and(&low).and(&high).for_each(|v, &l, &h| *v = (*v).max(l).min(h));
    Ok(Value::Array(NdArray::from_f64(x, arr.dtype())))
}

/// Map an array value from `[new_low, new_high]` onto `[low, high]`, clipping the result.
/// `None` leaves the value untouched.
pub fn rescale(value: Value, args: Option<&RescaleArgs>) -> Result<Value> {
    let Some(args) = args else { return Ok(value) };
    let arr = require_array(value, "rescale")?;
    if arr.shape() != args.low.shape() {
        return Err(GymError::InvalidValue(format!(
            "value of shape {:?} does not match rescale bounds of shape {:?}",
            arr.shape(),
            args.low.shape()
        )));
    }
    let mut x = arr.to_f64();
    Zip::from(&mut x)
        .and(&args.new_low)
        .and(&args.new_high)
        .and(&args.low)
        .and(&args.high)
        .for_each(|v, &nl, &nh, &l, &h| {
            let scaled = l + (h - l) * ((*v - nl) / (nh - nl));
            *v = scaled.max(l).min(h);
        });
    Ok(Value::Array(NdArray::from_f64(x, arr.dtype())))
}
