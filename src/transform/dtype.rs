//! Element type changes for Box leaves.

use tracing::warn;

use super::{ArgTree, transform_space};
use crate::core::{GymError, Result};
use crate::spaces::{BoxSpace, DType, DynSpace, Value};

/// Give a Box leaf a new element type. Bounds are kept; they are clamped to the range of an
/// integer target.
pub fn box_with_dtype(space: &DynSpace, dtype: &DType) -> Result<DynSpace> {
    let b = space.as_box().ok_or_else(|| {
        GymError::InvalidSpaceOperation(format!("cannot change the dtype of a {} space ({space})", space.kind()))
    })?;
    if b.dtype() == *dtype {
        return Ok(space.clone());
    }
    if narrows(b.dtype(), *dtype) {
        warn!(from = %b.dtype(), to = %dtype, "observation dtype narrowed, values may lose precision");
    }
    let (lo, hi) = (dtype.min_value(), dtype.max_value());
    let fit = |x: f64| if dtype.is_float() { x } else { x.clamp(lo, hi) };
    let low = b.low().mapv(fit);
    let high = b.high().mapv(fit);
    Ok(BoxSpace::new(low, high).with_dtype(*dtype).into())
}

fn narrows(from: DType, to: DType) -> bool {
    let rank = |d: DType| match d {
        DType::U8 => 0,
        DType::I32 => 1,
        DType::I64 => 2,
        DType::F32 => 3,
        DType::F64 => 4,
    };
    rank(to) < rank(from)
}

/// Change the dtype of every Box leaf that has a target dtype.
pub fn dtype_space(space: &DynSpace, args: &ArgTree<DType>) -> Result<DynSpace> {
    transform_space(space, args, &box_with_dtype)
}

/// Cast an array value. `None` leaves the value untouched.
pub fn cast(value: Value, dtype: Option<&DType>) -> Result<Value> {
    match (value, dtype) {
        (value, None) => Ok(value),
        (Value::Array(a), Some(dtype)) => Ok(Value::Array(a.cast(*dtype))),
        (other, Some(dtype)) => Err(GymError::InvalidValue(format!(
            "cannot cast a value of kind {} to {dtype}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::{BoxSpace, DictSpace, MultiBinary, Space};

    #[test]
    fn box_dtype_changes_and_bounds_fit() {
        let space: DynSpace = BoxSpace::uniform(-1000.0, 1000.0, &[3]).with_dtype(DType::F64).into();
        let out = dtype_space(&space, &ArgTree::leaf(DType::U8)).unwrap();
        let b = out.as_box().unwrap();
        assert_eq!(b.dtype(), DType::U8);
        assert!(b.low().iter().all(|&x| x == 0.0));
        assert!(b.high().iter().all(|&x| x == 255.0));
    }

    #[test]
    fn cast_value_matches_new_space() {
        let space: DynSpace = DictSpace::new([
            ("pos", DynSpace::from(BoxSpace::uniform(-1.0, 1.0, &[2]))),
            ("mask", MultiBinary::new(2).into()),
        ])
        .into();
        let args = ArgTree::dict([("pos", ArgTree::leaf(DType::F64))]);
        let out = dtype_space(&space, &args).unwrap();
        let v = cast(Value::f32s(&[0.5, -0.25]), Some(&DType::F64)).unwrap();
        assert_eq!(v, Value::f64s(&[0.5, -0.25]));
        assert!(out.get("pos").unwrap().contains(&v));
    }

    #[test]
    fn non_box_leaf_is_invalid_operation() {
        let space: DynSpace = MultiBinary::new(4).into();
        let err = dtype_space(&space, &ArgTree::leaf(DType::F32)).unwrap_err();
        assert!(matches!(err, GymError::InvalidSpaceOperation(_)));
        assert!(matches!(cast(Value::Discrete(1), Some(&DType::F32)), Err(GymError::InvalidValue(_))));
    }
}
