//! Reshaping Box leaves and their values.

use super::{ArgTree, transform_space};
use crate::core::{GymError, Result};
use crate::spaces::value::reshape_array;
use crate::spaces::{BoxSpace, DynSpace, Value, fmt_shape};

/// Reshape a Box leaf to `shape`, reshaping its bounds in row-major order.
///
/// Discrete, MultiBinary and MultiDiscrete leaves cannot be reshaped.
pub fn reshape_box(space: &DynSpace, shape: &Vec<usize>) -> Result<DynSpace> {
    let DynSpace::Box(b) = space else {
        return Err(GymError::InvalidSpaceOperation(format!(
            "cannot reshape a {} space ({space}) to {}",
            space.kind(),
            fmt_shape(shape)
        )));
    };
    let low = reshape_array(b.low().clone(), shape)?;
    let high = reshape_array(b.high().clone(), shape)?;
    Ok(BoxSpace::new(low, high).with_dtype(b.dtype()).into())
}

/// Reshape every Box leaf that has a target shape.
pub fn reshape_space(space: &DynSpace, args: &ArgTree<Vec<usize>>) -> Result<DynSpace> {
    transform_space(space, args, &reshape_box)
}

/// Reshape an array value. `None` leaves the value untouched.
pub fn reshape(value: Value, shape: Option<&Vec<usize>>) -> Result<Value> {
    match (value, shape) {
        (value, None) => Ok(value),
        (Value::Array(a), Some(shape)) => Ok(Value::Array(a.into_shape(shape)?)),
        (other, Some(_)) => Err(GymError::InvalidValue(format!(
            "cannot reshape a value of kind {}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::{DictSpace, Discrete, MultiBinary, MultiDiscrete, NdArray, TupleSpace};
    use ndarray::{ArrayD, IxDyn};

    fn image() -> DynSpace { BoxSpace::uniform(0.0, 1.0, &[96, 96, 3]).into() }

    #[test]
    fn reshape_box_space() {
        let out = reshape_space(&image(), &ArgTree::leaf(vec![96, 48, 6])).unwrap();
        assert_eq!(out.shape(), Some(vec![96, 48, 6]));
    }

    #[test]
    fn impossible_shape_is_shape_mismatch() {
        let err = reshape_space(&image(), &ArgTree::leaf(vec![96, 96, 4])).unwrap_err();
        assert!(matches!(err, GymError::ShapeMismatch(_)));
    }

    #[test]
    fn reshape_dict_only_touches_given_keys() {
        let space: DynSpace = DictSpace::new([("key_1", image()), ("key_2", image())]).into();
        let out = reshape_space(&space, &ArgTree::dict([("key_1", ArgTree::leaf(vec![96, 36, 8]))])).unwrap();
        assert_eq!(out.get("key_1").unwrap().shape(), Some(vec![96, 36, 8]));
        assert_eq!(out.get("key_2"), space.get("key_2"));
    }

    #[test]
    fn reshape_nested_tuple() {
        let space: DynSpace = TupleSpace::new([
            image(),
            TupleSpace::new([DynSpace::from(Discrete::new(3)), image()]).into(),
        ])
        .into();
        let args = ArgTree::tuple([
            ArgTree::Unset,
            ArgTree::tuple([ArgTree::Unset, ArgTree::leaf(vec![96 * 96 * 3])]),
        ]);
        let out = reshape_space(&space, &args).unwrap();
        assert_eq!(out.index(0), space.index(0));
        assert_eq!(out.index(1).and_then(|t| t.index(1)).unwrap().shape(), Some(vec![27648]));
    }

    #[test]
    fn non_reshapable_leaves() {
        for leaf in [
            DynSpace::from(Discrete::new(5)),
            MultiBinary::new(10).into(),
            MultiDiscrete::new(vec![5, 3]).into(),
        ] {
            assert_eq!(reshape_space(&leaf, &ArgTree::Unset).unwrap(), leaf);
            let err = reshape_space(&leaf, &ArgTree::leaf(vec![2, 5])).unwrap_err();
            assert!(matches!(err, GymError::InvalidSpaceOperation(_)));
        }
    }

    #[test]
    fn reshape_values() {
        let v = Value::Array(NdArray::U8(ArrayD::zeros(IxDyn(&[4, 6]))));
        let out = reshape(v, Some(&vec![24])).unwrap();
        assert_eq!(out.as_array().unwrap().shape(), &[24]);
        assert_eq!(reshape(Value::Discrete(1), None).unwrap(), Value::Discrete(1));
    }
}
