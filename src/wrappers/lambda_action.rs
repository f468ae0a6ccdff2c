//! Action wrappers: a generic leaf-function wrapper plus clipping and rescaling built on it.

use tracing::debug;

use super::LeafFn;
use crate::core::{Env, Info, Result, Step};
use crate::spaces::utils::apply_function;
use crate::spaces::{DynSpace, Value};
use crate::transform::bounds::{clip, rescale};
use crate::transform::{ArgTree, Bounds, RescaleArgs, extend_args, transform_space_bounds};

/// Transforms every action with `f` before it reaches the inner environment.
///
/// `f` is called on each leaf of the action with that leaf's argument from `args` (`None` where
/// unset). The wrapper's action space is `action_space` when given, otherwise the inner one;
/// incoming actions are walked against it.
pub struct LambdaAction<E, L, F>
where
    E: Env,
    F: Fn(Value, Option<&L>) -> Result<Value>,
{
    inner: E,
    f: F,
    args: ArgTree<L>,
    action_space: DynSpace,
}

impl<E, L, F> LambdaAction<E, L, F>
where
    E: Env,
    F: Fn(Value, Option<&L>) -> Result<Value>,
{
    pub fn new(inner: E, f: F, args: ArgTree<L>, action_space: Option<DynSpace>) -> Self {
        let action_space = action_space.unwrap_or_else(|| inner.action_space().clone());
        debug!(%action_space, "lambda action wrapper");
        Self { inner, f, args, action_space }
    }

    pub fn args(&self) -> &ArgTree<L> { &self.args }

    /// The action that would be forwarded to the inner environment.
    pub fn action(&self, action: Value) -> Result<Value> {
        apply_function(&self.action_space, action, &self.f, &self.args)
    }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E, L, F> Env for LambdaAction<E, L, F>
where
    E: Env,
    F: Fn(Value, Option<&L>) -> Result<Value>,
{
    fn action_space(&self) -> &DynSpace { &self.action_space }
    fn observation_space(&self) -> &DynSpace { self.inner.observation_space() }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> { self.inner.reset(seed) }

    fn step(&mut self, action: Value) -> Result<Step> {
        let action = self.action(action)?;
        self.inner.step(action)
    }

    fn close(&mut self) { self.inner.close() }
}

/// Clips Box actions into new bounds. The action space advertises the new bounds.
pub struct ClipActions<E: Env>(LambdaAction<E, Bounds, LeafFn<Bounds>>);

impl<E: Env> ClipActions<E> {
    /// Fails when `args` does not fit the action space or names a non-Box leaf.
    pub fn new(inner: E, args: ArgTree<Bounds>) -> Result<Self> {
        let space = transform_space_bounds(inner.action_space(), &args)?;
        Ok(Self(LambdaAction::new(inner, clip as LeafFn<Bounds>, args, Some(space))))
    }

    pub fn inner(&self) -> &E { self.0.inner() }
    pub fn inner_mut(&mut self) -> &mut E { self.0.inner_mut() }
    pub fn into_inner(self) -> E { self.0.into_inner() }
}

impl<E: Env> Env for ClipActions<E> {
    fn action_space(&self) -> &DynSpace { self.0.action_space() }
    fn observation_space(&self) -> &DynSpace { self.0.observation_space() }
    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> { self.0.reset(seed) }
    fn step(&mut self, action: Value) -> Result<Step> { self.0.step(action) }
    fn close(&mut self) { self.0.close() }
}

/// Exposes Box actions in new bounds and maps them affinely back onto the inner bounds.
pub struct ScaleActions<E: Env>(LambdaAction<E, RescaleArgs, LeafFn<RescaleArgs>>);

impl<E: Env> ScaleActions<E> {
    /// Fails when `args` does not fit the action space, names a non-Box leaf, gives an empty
    /// range or targets an unbounded leaf.
    pub fn new(inner: E, args: ArgTree<Bounds>) -> Result<Self> {
        let space = transform_space_bounds(inner.action_space(), &args)?;
        let extended = extend_args(inner.action_space(), &args)?;
        Ok(Self(LambdaAction::new(inner, rescale as LeafFn<RescaleArgs>, extended, Some(space))))
    }

    pub fn inner(&self) -> &E { self.0.inner() }
    pub fn inner_mut(&mut self) -> &mut E { self.0.inner_mut() }
    pub fn into_inner(self) -> E { self.0.into_inner() }
}

impl<E: Env> Env for ScaleActions<E> {
    fn action_space(&self) -> &DynSpace { self.0.action_space() }
    fn observation_space(&self) -> &DynSpace { self.0.observation_space() }
    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> { self.0.reset(seed) }
    fn step(&mut self, action: Value) -> Result<Step> { self.0.step(action) }
    fn close(&mut self) { self.0.close() }
}
