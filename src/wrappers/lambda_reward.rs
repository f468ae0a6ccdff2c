//! Reward wrappers.

use tracing::debug;

use crate::core::{Env, GymError, Info, Result, Step};
use crate::spaces::{DynSpace, Value};

/// Maps rewards through a user-provided function (e.g., scaling).
pub struct LambdaReward<E, F>
where
    E: Env,
    F: Fn(f32) -> f32,
{
    inner: E,
    f: F,
}

impl<E, F> LambdaReward<E, F>
where
    E: Env,
    F: Fn(f32) -> f32,
{
    pub fn new(inner: E, f: F) -> Self { Self { inner, f } }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E, F> Env for LambdaReward<E, F>
where
    E: Env,
    F: Fn(f32) -> f32,
{
    fn action_space(&self) -> &DynSpace { self.inner.action_space() }
    fn observation_space(&self) -> &DynSpace { self.inner.observation_space() }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> { self.inner.reset(seed) }

    fn step(&mut self, action: Value) -> Result<Step> {
        let mut s = self.inner.step(action)?;
        s.reward = (self.f)(s.reward);
        Ok(s)
    }

    fn close(&mut self) { self.inner.close() }
}

/// Clamps rewards into `[low, high]`; a missing side is unbounded.
pub struct ClipRewards<E: Env> {
    inner: E,
    low: f32,
    high: f32,
}

impl<E: Env> ClipRewards<E> {
    /// Fails with `InvalidBound` when both bounds are missing or `high < low`.
    pub fn new(inner: E, low: Option<f32>, high: Option<f32>) -> Result<Self> {
        if low.is_none() && high.is_none() {
            return Err(GymError::InvalidBound("clip_rewards needs at least one of low or high".into()));
        }
        let low = low.unwrap_or(f32::NEG_INFINITY);
        let high = high.unwrap_or(f32::INFINITY);
        if high < low {
            return Err(GymError::InvalidBound(format!("reward bound high {high} is below low {low}")));
        }
        debug!(low, high, "clip rewards wrapper");
        Ok(Self { inner, low, high })
    }

    pub fn inner(&self) -> &E { &self.inner }
    pub fn inner_mut(&mut self) -> &mut E { &mut self.inner }
    pub fn into_inner(self) -> E { self.inner }
}

impl<E: Env> Env for ClipRewards<E> {
    fn action_space(&self) -> &DynSpace { self.inner.action_space() }
    fn observation_space(&self) -> &DynSpace { self.inner.observation_space() }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> { self.inner.reset(seed) }

    fn step(&mut self, action: Value) -> Result<Step> {
        let mut s = self.inner.step(action)?;
        if s.reward < self.low { s.reward = self.low; }
        if s.reward > self.high { s.reward = self.high; }
        Ok(s)
    }

    fn close(&mut self) { self.inner.close() }
}
