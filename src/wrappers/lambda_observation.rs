//! Observation wrappers. Each derives its observation space once, at construction, and rewrites
//! every observation returned by `reset` and `step`.

use tracing::debug;

use super::LeafFn;
use crate::core::{Env, Info, Result, Step};
use crate::spaces::utils::{apply_function, flatten, flatten_space};
use crate::spaces::{DType, DynSpace, Value};
use crate::transform::dtype::cast;
use crate::transform::grayscale::grayscale;
use crate::transform::reshape::reshape;
use crate::transform::resize::resize;
use crate::transform::{ArgTree, dtype_space, filter_space, filter_value, grayscale_space, reshape_space, resize_space};

/// Transforms every observation with `f`, leaf by leaf.
///
/// Observations are walked against the inner observation space. The wrapper's observation space
/// is `observation_space` when given, otherwise the inner one.
pub struct LambdaObservation<E, L, F>
where
    E: Env,
    F: Fn(Value, Option<&L>) -> Result<Value>,
{
    inner: E,
    f: F,
    args: ArgTree<L>,
    observation_space: DynSpace,
}

impl<E, L, F> LambdaObservation<E, L, F>
where
    E: Env,
    F: Fn(Value, Option<&L>) -> Result<Value>,
{
    pub fn new(inner: E, f: F, args: ArgTree<L>, observation_space: Option<DynSpace>) -> Self {
        let observation_space = observation_space.unwrap_or_else(|| inner.observation_space().clone());
        debug!(%observation_space, "lambda observation wrapper");
        Self { inner, f, args, observation_space }
    }

    pub fn args(&self) -> &ArgTree<L> { &self.args }

    /// Transform an observation of the inner environment.
    pub fn observation(&self, observation: Value) -> Result<Value> {
        apply_function(self.inner.observation_space(), observation, &self.f, &self.args)
    }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E, L, F> Env for LambdaObservation<E, L, F>
where
    E: Env,
    F: Fn(Value, Option<&L>) -> Result<Value>,
{
    fn action_space(&self) -> &DynSpace { self.inner.action_space() }
    fn observation_space(&self) -> &DynSpace { &self.observation_space }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> {
        let (obs, info) = self.inner.reset(seed)?;
        Ok((self.observation(obs)?, info))
    }

    fn step(&mut self, action: Value) -> Result<Step> {
        let s = self.inner.step(action)?;
        let observation = self.observation(s.observation)?;
        Ok(Step { observation, ..s })
    }

    fn close(&mut self) { self.inner.close() }
}

/// Observation wrapper built from a fixed leaf function, with `new` deriving its space.
macro_rules! leaf_observation_wrapper {
    ($(#[$doc:meta])* $name:ident, $arg:ty, $leaf:path, $space_fn:path) => {
        $(#[$doc])*
        pub struct $name<E: Env>(LambdaObservation<E, $arg, LeafFn<$arg>>);

        impl<E: Env> $name<E> {
            pub fn new(inner: E, args: ArgTree<$arg>) -> Result<Self> {
                let space = $space_fn(inner.observation_space(), &args)?;
                Ok(Self(LambdaObservation::new(inner, $leaf as LeafFn<$arg>, args, Some(space))))
            }

            pub fn inner(&self) -> &E { self.0.inner() }
            pub fn inner_mut(&mut self) -> &mut E { self.0.inner_mut() }
            pub fn into_inner(self) -> E { self.0.into_inner() }
        }

        impl<E: Env> Env for $name<E> {
            fn action_space(&self) -> &DynSpace { self.0.action_space() }
            fn observation_space(&self) -> &DynSpace { self.0.observation_space() }
            fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> { self.0.reset(seed) }
            fn step(&mut self, action: Value) -> Result<Step> { self.0.step(action) }
            fn close(&mut self) { self.0.close() }
        }
    };
}

leaf_observation_wrapper!(
    /// Reshapes Box observations; the element count of each leaf must be unchanged.
    ReshapeObservations, Vec<usize>, reshape, reshape_space
);

leaf_observation_wrapper!(
    /// Resizes image observations to `(h, w)` or `(h, w, c)`.
    ResizeObservations, Vec<usize>, resize, resize_space
);

leaf_observation_wrapper!(
    /// Casts Box observations to a new element type.
    ObservationsDtype, DType, cast, dtype_space
);

leaf_observation_wrapper!(
    /// Converts `(h, w, 3)` image observations to `(h, w)` grayscale.
    GrayscaleObservations, bool, grayscale, grayscale_space
);

impl<E: Env> GrayscaleObservations<E> {
    /// Grayscale a single-image observation space.
    pub fn from_env(inner: E) -> Result<Self> { Self::new(inner, ArgTree::leaf(true)) }
}

/// Drops children of Dict/Tuple observations.
pub struct FilterObservations<E: Env> {
    inner: E,
    args: ArgTree<bool>,
    observation_space: DynSpace,
}

impl<E: Env> FilterObservations<E> {
    pub fn new(inner: E, args: ArgTree<bool>) -> Result<Self> {
        let observation_space = filter_space(inner.observation_space(), &args)?;
        debug!(%observation_space, "filter observations wrapper");
        Ok(Self { inner, args, observation_space })
    }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E: Env> Env for FilterObservations<E> {
    fn action_space(&self) -> &DynSpace { self.inner.action_space() }
    fn observation_space(&self) -> &DynSpace { &self.observation_space }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> {
        let (obs, info) = self.inner.reset(seed)?;
        Ok((filter_value(self.inner.observation_space(), obs, &self.args)?, info))
    }

    fn step(&mut self, action: Value) -> Result<Step> {
        let s = self.inner.step(action)?;
        let observation = filter_value(self.inner.observation_space(), s.observation, &self.args)?;
        Ok(Step { observation, ..s })
    }

    fn close(&mut self) { self.inner.close() }
}

/// Flattens observations into a 1-d Box; Discrete parts become one-hot vectors.
pub struct FlattenObservations<E: Env> {
    inner: E,
    observation_space: DynSpace,
}

impl<E: Env> FlattenObservations<E> {
    pub fn new(inner: E) -> Result<Self> {
        let observation_space: DynSpace = flatten_space(inner.observation_space())?.into();
        debug!(%observation_space, "flatten observations wrapper");
        Ok(Self { inner, observation_space })
    }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E: Env> Env for FlattenObservations<E> {
    fn action_space(&self) -> &DynSpace { self.inner.action_space() }
    fn observation_space(&self) -> &DynSpace { &self.observation_space }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> {
        let (obs, info) = self.inner.reset(seed)?;
        Ok((flatten(self.inner.observation_space(), &obs)?, info))
    }

    fn step(&mut self, action: Value) -> Result<Step> {
        let s = self.inner.step(action)?;
        let observation = flatten(self.inner.observation_space(), &s.observation)?;
        Ok(Step { observation, ..s })
    }

    fn close(&mut self) { self.inner.close() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::testing::TestingEnv;
    use crate::spaces::{BoxSpace, DictSpace, Discrete, Space};

    fn dict_env() -> TestingEnv {
        let obs: DynSpace = DictSpace::new([
            ("pos", DynSpace::from(BoxSpace::uniform(-1.0, 1.0, &[2, 3]))),
            ("target", Discrete::new(4).into()),
        ])
        .into();
        TestingEnv::new(Discrete::new(2).into(), obs)
    }

    #[test]
    fn reshape_dict_observation() {
        let args = ArgTree::dict([("pos", ArgTree::leaf(vec![6]))]);
        let mut env = ReshapeObservations::new(dict_env(), args).unwrap();
        let (obs, _) = env.reset(Some(1)).unwrap();
        assert_eq!(obs.get("pos").unwrap().as_array().unwrap().shape(), &[6]);
        assert!(env.observation_space().contains(&obs));
        let step = env.step(Value::Discrete(0)).unwrap();
        assert!(env.observation_space().contains(&step.observation));
    }

    #[test]
    fn dtype_observation() {
        let args = ArgTree::dict([("pos", ArgTree::leaf(DType::F64))]);
        let mut env = ObservationsDtype::new(dict_env(), args).unwrap();
        let step = env.step(Value::Discrete(1)).unwrap();
        assert_eq!(step.observation.get("pos").unwrap().as_array().unwrap().dtype(), DType::F64);
        assert!(env.observation_space().contains(&step.observation));
    }

    #[test]
    fn filter_and_flatten() {
        let args = ArgTree::dict([("target", ArgTree::leaf(false))]);
        let mut env = FilterObservations::new(dict_env(), args).unwrap();
        let (obs, _) = env.reset(None).unwrap();
        assert!(obs.get("target").is_none());
        assert!(env.observation_space().contains(&obs));

        let mut env = FlattenObservations::new(dict_env()).unwrap();
        assert_eq!(env.observation_space().shape(), Some(vec![10]));
        let step = env.step(Value::Discrete(0)).unwrap();
        assert!(env.observation_space().contains(&step.observation));
    }

    #[test]
    fn lambda_observation_sees_none_for_unset_leaves() {
        let count = |v: Value, arg: Option<&i64>| -> Result<Value> {
            match (v, arg) {
                (Value::Discrete(x), Some(k)) => Ok(Value::Discrete(x + k)),
                (v, _) => Ok(v),
            }
        };
        let args = ArgTree::dict([("target", ArgTree::leaf(100))]);
        let mut env = LambdaObservation::new(dict_env(), count, args, None);
        let step = env.step(Value::Discrete(0)).unwrap();
        assert!(step.observation.get("target").unwrap().as_discrete().unwrap() >= 100);
        assert!(env.inner().observation_space().get("pos").unwrap().contains(step.observation.get("pos").unwrap()));
    }
}
