// Common trait for spaces

use rand::Rng;

use super::Value;

/// A trait implemented by all spaces: leaf spaces, composites and [`super::DynSpace`].
pub trait Space {
    /// Draw a sample from the space using the provided RNG.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value;

    /// Return true if the given value is a valid member of the space.
    fn contains(&self, value: &Value) -> bool;
}
