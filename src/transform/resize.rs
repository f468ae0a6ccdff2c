//! Resizing image-like Box leaves (`(h, w)` or `(h, w, c)`) with the `image` crate.
//!
//! Bounds are resampled nearest-neighbour directly on the array so they stay exact (infinite
//! bounds included); values are resized with the `image` crate's triangle (bilinear) filter.

use ndarray::{Array3, ArrayD, Axis, Ix3};

use super::{ArgTree, transform_space};
use crate::core::{GymError, Result};
use crate::spaces::{BoxSpace, DynSpace, NdArray, Value, fmt_shape};

/// Check `target` against an image-like `shape` and return `(height, width)`.
fn target_size(shape: &[usize], target: &[usize]) -> Result<(usize, usize)> {
    let compatible = match (shape, target) {
        ([_, _], [h, w]) | ([_, _, _], [h, w]) => *h > 0 && *w > 0,
        ([_, _, c], [h, w, c2]) => *h > 0 && *w > 0 && c == c2,
        _ => false,
    };
    if !compatible {
        return Err(GymError::ShapeMismatch(format!(
            "cannot resize shape {} to {}; expected (h, w) or (h, w, {})",
            fmt_shape(shape),
            fmt_shape(target),
            shape.get(2).map_or("c".to_string(), |c| c.to_string())
        )));
    }
    Ok((target[0], target[1]))
}

/// Resize a Box leaf to `shape`. Only image-like boxes can be resized.
pub fn resize_box(space: &DynSpace, shape: &Vec<usize>) -> Result<DynSpace> {
    let DynSpace::Box(b) = space else {
        return Err(GymError::InvalidSpaceOperation(format!(
            "cannot resize a {} space ({space}) to {}",
            space.kind(),
            fmt_shape(shape)
        )));
    };
    require_image_support()?;
    let (h, w) = target_size(b.shape(), shape)?;
    let low = resize_array(b.low(), h, w, Filter::Nearest)?;
    let high = resize_array(b.high(), h, w, Filter::Nearest)?;
    Ok(BoxSpace::new(low, high).with_dtype(b.dtype()).into())
}

/// Resize every Box leaf that has a target shape.
pub fn resize_space(space: &DynSpace, args: &ArgTree<Vec<usize>>) -> Result<DynSpace> {
    transform_space(space, args, &resize_box)
}

/// Resize an image value. `None` leaves the value untouched.
pub fn resize(value: Value, shape: Option<&Vec<usize>>) -> Result<Value> {
    let Some(shape) = shape else { return Ok(value) };
    let arr = match value {
        Value::Array(arr) => arr,
        other => {
            return Err(GymError::InvalidValue(format!("cannot resize a value of kind {}", other.kind())));
        }
    };
    let (h, w) = target_size(arr.shape(), shape)?;
    let mut out = resize_array(&arr.to_f64(), h, w, Filter::Triangle)?;
    if !arr.dtype().is_float() {
        out.mapv_inplace(f64::round);
    }
    Ok(Value::Array(NdArray::from_f64(out, arr.dtype())))
}

#[derive(Clone, Copy, Debug)]
enum Filter {
    Nearest,
    Triangle,
}

/// Resize the two leading axes of a 2-d or 3-d array, channel by channel.
fn resize_array(src: &ArrayD<f64>, h: usize, w: usize, filter: Filter) -> Result<ArrayD<f64>> {
    let two_d = src.ndim() == 2;
    let src3 = if two_d { src.clone().insert_axis(Axis(2)) } else { src.clone() };
    let src3 = src3
        .into_dimensionality::<Ix3>()
        .map_err(|e| GymError::ShapeMismatch(format!("expected an image-like array: {e}")))?;
    let channels = src3.dim().2;
    let mut out = Array3::<f64>::zeros((h, w, channels));
    for c in 0..channels {
        let plane = src3.index_axis(Axis(2), c);
        let resized = match filter {
            Filter::Nearest => nearest_plane(plane, h, w),
            Filter::Triangle => scale_plane(plane, h, w)?,
        };
        out.index_axis_mut(Axis(2), c).assign(&resized);
    }
    let out = out.into_dyn();
    Ok(if two_d { out.index_axis_move(Axis(2), 0) } else { out })
}

/// Nearest-neighbour resampling: destination pixel `d` reads source pixel
/// `floor((d + 0.5) * src_len / dst_len)`.
fn nearest_plane(plane: ndarray::ArrayView2<f64>, h: usize, w: usize) -> ndarray::Array2<f64> {
    let (ph, pw) = plane.dim();
    let src = |d: usize, dst_len: usize, src_len: usize| {
        (((d as f64 + 0.5) * src_len as f64 / dst_len as f64).floor() as usize).min(src_len - 1)
    };
    ndarray::Array2::from_shape_fn((h, w), |(y, x)| plane[[src(y, h, ph), src(x, w, pw)]])
}

#[cfg(feature = "image")]
fn require_image_support() -> Result<()> { Ok(()) }

#[cfg(not(feature = "image"))]
fn require_image_support() -> Result<()> {
    Err(GymError::NotSupported("resizing requires the `image` feature".into()))
}

#[cfg(feature = "image")]
fn scale_plane(plane: ndarray::ArrayView2<f64>, h: usize, w: usize) -> Result<ndarray::Array2<f64>> {
    use image::imageops::{self, FilterType};
    use image::{ImageBuffer, Luma};

    let (ph, pw) = plane.dim();
    // Filtered float pixels are clamped to [0, 1], so the plane is normalized first.
    let lo = plane.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = plane.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !(lo.is_finite() && hi.is_finite()) {
        return Err(GymError::InvalidValue("cannot interpolate non-finite pixels".into()));
    }
    let scale = if hi > lo { hi - lo } else { 1.0 };
    let buf: ImageBuffer<Luma<f32>, Vec<f32>> = ImageBuffer::from_fn(pw as u32, ph as u32, |x, y| {
        Luma([((plane[[y as usize, x as usize]] - lo) / scale) as f32])
    });
    let resized = imageops::resize(&buf, w as u32, h as u32, FilterType::Triangle);
    Ok(ndarray::Array2::from_shape_fn((h, w), |(y, x)| {
        lo + resized.get_pixel(x as u32, y as u32)[0] as f64 * scale
    }))
}

#[cfg(not(feature = "image"))]
fn scale_plane(_plane: ndarray::ArrayView2<f64>, _h: usize, _w: usize) -> Result<ndarray::Array2<f64>> {
    Err(GymError::NotSupported("resizing requires the `image` feature".into()))
}

#[cfg(all(test, feature = "image"))]
mod tests {
    use super::*;
    use crate::spaces::{DType, DictSpace, Discrete, MultiBinary, Space};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn car_racing() -> DynSpace { BoxSpace::uniform(0.0, 255.0, &[96, 96, 3]).with_dtype(DType::U8).into() }

    #[test]
    fn resize_image_space_and_value() {
        let space = car_racing();
        let out = resize_space(&space, &ArgTree::leaf(vec![32, 32, 3])).unwrap();
        assert_eq!(out.shape(), Some(vec![32, 32, 3]));
        assert_eq!(out.dtype(), Some(DType::U8));
        assert!(out.as_box().unwrap().high().iter().all(|&x| x == 255.0));

        let mut rng = StdRng::seed_from_u64(0);
        let obs = resize(space.sample(&mut rng), Some(&vec![32, 32, 3])).unwrap();
        assert_eq!(obs.as_array().unwrap().shape(), &[32, 32, 3]);
        assert!(out.contains(&obs));
    }

    #[test]
    fn resize_to_height_width_keeps_channels() {
        let out = resize_space(&car_racing(), &ArgTree::leaf(vec![48, 64])).unwrap();
        assert_eq!(out.shape(), Some(vec![48, 64, 3]));
    }

    #[test]
    fn resize_two_d_box() {
        let space: DynSpace = BoxSpace::uniform(-1.0, 1.0, &[10, 10]).into();
        let out = resize_space(&space, &ArgTree::leaf(vec![5, 20])).unwrap();
        assert_eq!(out.shape(), Some(vec![5, 20]));
        let b = out.as_box().unwrap();
        assert!(b.low().iter().all(|&x| x == -1.0));
        assert!(b.high().iter().all(|&x| x == 1.0));

        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..5 {
            let obs = resize(space.sample(&mut rng), Some(&vec![5, 20])).unwrap();
            assert!(out.contains(&obs));
        }
    }

    #[test]
    fn bounds_are_resampled_nearest() {
        let low = ndarray::arr2(&[[-4.0, -3.0], [-2.0, f64::NEG_INFINITY]]).into_dyn();
        let high = ndarray::arr2(&[[1.0, 2.0], [3.0, f64::INFINITY]]).into_dyn();
        let space: DynSpace = BoxSpace::new(low, high).into();
        let out = resize_space(&space, &ArgTree::leaf(vec![4, 4])).unwrap();
        let b = out.as_box().unwrap();
        assert_eq!(b.low()[[0, 0]], -4.0);
        assert_eq!(b.low()[[1, 3]], -3.0);
        assert_eq!(b.high()[[3, 0]], 3.0);
        assert_eq!(b.low()[[3, 3]], f64::NEG_INFINITY);
        assert_eq!(b.high()[[2, 2]], f64::INFINITY);
    }

    #[test]
    fn channel_change_is_shape_mismatch() {
        let err = resize_space(&car_racing(), &ArgTree::leaf(vec![32, 32, 1])).unwrap_err();
        assert!(matches!(err, GymError::ShapeMismatch(_)));
        let flat: DynSpace = BoxSpace::uniform(0.0, 1.0, &[4]).into();
        assert!(matches!(resize_space(&flat, &ArgTree::leaf(vec![2, 2])), Err(GymError::ShapeMismatch(_))));
    }

    #[test]
    fn resize_discrete_is_invalid_operation() {
        let space: DynSpace = Discrete::new(5).into();
        let err = resize_space(&space, &ArgTree::leaf(vec![2, 2])).unwrap_err();
        assert!(matches!(err, GymError::InvalidSpaceOperation(_)));
        assert_eq!(resize_space(&space, &ArgTree::Unset).unwrap(), space);
    }

    #[test]
    fn resize_inside_dict() {
        let space: DynSpace = DictSpace::new([("obs", car_racing()), ("mask", MultiBinary::new(3).into())]).into();
        let out = resize_space(&space, &ArgTree::dict([("obs", ArgTree::leaf(vec![16, 16, 3]))])).unwrap();
        assert_eq!(out.get("obs").unwrap().shape(), Some(vec![16, 16, 3]));
        assert_eq!(out.get("mask"), space.get("mask"));
    }
}
