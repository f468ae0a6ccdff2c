//! RGB to grayscale conversion for `(h, w, 3)` image boxes.

use ndarray::{ArrayD, Axis, IxDyn};
use tracing::warn;

use super::{ArgTree, transform_space};
use crate::core::{GymError, Result};
use crate::spaces::{BoxSpace, DType, DynSpace, NdArray, Value, fmt_shape};

const LUMA: [f64; 3] = [0.299, 0.587, 0.114];

fn is_rgb(shape: &[usize]) -> bool { matches!(shape, [_, _, 3]) }

/// Turn an RGB Box leaf into a `(h, w)` grayscale box with bounds `[0, 255]`.
/// `false` leaves the leaf unchanged.
pub fn grayscale_box(space: &DynSpace, enabled: &bool) -> Result<DynSpace> {
    if !enabled {
        return Ok(space.clone());
    }
    let b = match space {
        DynSpace::Box(b) if is_rgb(b.shape()) => b,
        DynSpace::Box(b) => {
            return Err(GymError::InvalidSpaceOperation(format!(
                "grayscale needs an (h, w, 3) image, got shape {}",
                fmt_shape(b.shape())
            )));
        }
        other => {
            return Err(GymError::InvalidSpaceOperation(format!(
                "cannot convert a {} space ({other}) to grayscale",
                other.kind()
            )));
        }
    };
    if b.dtype() != DType::U8 {
        warn!(dtype = %b.dtype(), "grayscale conversion of a non-uint8 image");
    }
    let shape = &b.shape()[..2];
    Ok(BoxSpace::uniform(0.0, 255.0, shape).with_dtype(b.dtype()).into())
}

/// Convert every selected RGB leaf to grayscale.
pub fn grayscale_space(space: &DynSpace, args: &ArgTree<bool>) -> Result<DynSpace> {
    transform_space(space, args, &grayscale_box)
}

/// Weighted sum of the colour channels of an `(h, w, 3)` value.
/// `None` and `false` leave the value untouched.
pub fn grayscale(value: Value, enabled: Option<&bool>) -> Result<Value> {
    if enabled != Some(&true) {
        return Ok(value);
    }
    let arr = match value {
        Value::Array(arr) if is_rgb(arr.shape()) => arr,
        other => {
            return Err(GymError::InvalidValue(format!(
                "grayscale needs an (h, w, 3) image, got a value of kind {}",
                other.kind()
            )));
        }
    };
    let rgb = arr.to_f64();
    let mut gray = ArrayD::<f64>::zeros(IxDyn(&rgb.shape()[..2]));
    for (c, weight) in LUMA.iter().enumerate() {
        gray.scaled_add(*weight, &rgb.index_axis(Axis(2), c));
    }
    if !arr.dtype().is_float() {
        gray.mapv_inplace(f64::round);
    }
    Ok(Value::Array(NdArray::from_f64(gray, arr.dtype())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::{Discrete, Space};
    use ndarray::Array3;

    fn rgb() -> DynSpace { BoxSpace::uniform(0.0, 255.0, &[4, 5, 3]).with_dtype(DType::U8).into() }

    #[test]
    fn rgb_box_becomes_two_d() {
        let out = grayscale_space(&rgb(), &ArgTree::leaf(true)).unwrap();
        assert_eq!(out.shape(), Some(vec![4, 5]));
        assert_eq!(out.dtype(), Some(DType::U8));
        assert_eq!(grayscale_space(&rgb(), &ArgTree::leaf(false)).unwrap(), rgb());
    }

    #[test]
    fn non_image_leaves_are_rejected() {
        let flat: DynSpace = BoxSpace::uniform(0.0, 1.0, &[4]).into();
        let discrete: DynSpace = Discrete::new(3).into();
        for space in [flat, discrete] {
            let err = grayscale_space(&space, &ArgTree::leaf(true)).unwrap_err();
            assert!(matches!(err, GymError::InvalidSpaceOperation(_)));
        }
    }

    #[test]
    fn white_pixels_stay_white() {
        let white = Value::Array(NdArray::U8(Array3::from_elem((4, 5, 3), 255u8).into_dyn()));
        let out = grayscale(white, Some(&true)).unwrap();
        let space = grayscale_space(&rgb(), &ArgTree::leaf(true)).unwrap();
        assert!(space.contains(&out));
        assert!(out.to_f64().unwrap().iter().all(|&x| x == 255.0));
    }

    #[test]
    fn weights_follow_luma() {
        let mut img = Array3::<f64>::zeros((1, 1, 3));
        img[[0, 0, 1]] = 100.0;
        let out = grayscale(Value::from(img.into_dyn()), Some(&true)).unwrap();
        assert!((out.to_f64().unwrap()[[0, 0]] - 58.7).abs() < 1e-9);
    }
}
