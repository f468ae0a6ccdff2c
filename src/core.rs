// Core traits and types shared by spaces, transforms and wrappers.

use crate::spaces::{DynSpace, Value};

/// A small ordered info map returned alongside observations.
/// Keys keep insertion order; inserting an existing key replaces its value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Info {
    entries: Vec<(String, InfoValue)>,
}

impl Info {
    /// Create an empty Info map.
    pub fn new() -> Self { Self { entries: Vec::new() } }

    /// Insert or replace a key with the given value.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: InfoValue) {
        let k = key.into();
        if let Some((_, v)) = self.entries.iter_mut().find(|(kk, _)| kk == &k) {
            *v = value;
        } else {
            self.entries.push((k, value));
        }
    }

    /// Get a reference to a value by key.
    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }
}

/// Value types stored in an [`Info`] map.
#[derive(Clone, Debug, PartialEq)]
pub enum InfoValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
    /// A structured value, e.g. the action actually executed by an environment.
    Value(Value),
}

impl InfoValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            InfoValue::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for InfoValue { fn from(v: bool) -> Self { InfoValue::Bool(v) } }
impl From<i64> for InfoValue { fn from(v: i64) -> Self { InfoValue::I64(v) } }
impl From<i32> for InfoValue { fn from(v: i32) -> Self { InfoValue::I64(v as i64) } }
impl From<f64> for InfoValue { fn from(v: f64) -> Self { InfoValue::F64(v) } }
impl From<f32> for InfoValue { fn from(v: f32) -> Self { InfoValue::F64(v as f64) } }
impl From<&str> for InfoValue { fn from(v: &str) -> Self { InfoValue::Str(v.to_string()) } }
impl From<String> for InfoValue { fn from(v: String) -> Self { InfoValue::Str(v) } }
impl From<Value> for InfoValue { fn from(v: Value) -> Self { InfoValue::Value(v) } }

/// A step result from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct Step<Obs = Value> {
    pub observation: Obs,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
}

impl<Obs> Step<Obs> {
    pub fn new(observation: Obs, reward: f32, terminated: bool, truncated: bool, info: Info) -> Self {
        Self { observation, reward, terminated, truncated, info }
    }

    /// Replace the observation, keeping reward, flags and info.
    pub fn map_observation<O2>(self, f: impl FnOnce(Obs) -> O2) -> Step<O2> {
        Step::new(f(self.observation), self.reward, self.terminated, self.truncated, self.info)
    }
}

/// Errors raised by spaces, transforms and wrappers.
///
/// Construction-time problems (`ShapeMismatch`, `InvalidSpaceOperation`, `InvalidBound`) are
/// returned by wrapper constructors. Per-call problems (`InvalidAction`, `InvalidValue`) are
/// returned from `step`/`reset` and leave the wrapper usable.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GymError {
    #[error("Invalid action: {0}")]
    InvalidAction(String),
    #[error("Invalid observation: {0}")]
    InvalidObservation(String),
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("Invalid space operation: {0}")]
    InvalidSpaceOperation(String),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Invalid bound: {0}")]
    InvalidBound(String),
    #[error("Operation not supported: {0}")]
    NotSupported(String),
    #[error("Other error: {0}")]
    Other(String),
}

/// Convenience alias for results using GymError.
pub type Result<T> = std::result::Result<T, GymError>;

/// Core environment trait following the Gymnasium contract.
///
/// Actions and observations are [`Value`] trees described by the environment's spaces.
pub trait Env {
    /// The space actions passed to [`Env::step`] must belong to.
    fn action_space(&self) -> &DynSpace;

    /// The space observations returned by the environment belong to.
    fn observation_space(&self) -> &DynSpace;

    /// Reset the environment to an initial state.
    /// Implementations should re-seed internal RNGs when `seed` is provided.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)>;

    /// Apply an action and advance the environment by one step.
    fn step(&mut self, action: Value) -> Result<Step>;

    /// Close and release any external resources.
    fn close(&mut self) {}
}

impl<E: Env + ?Sized> Env for Box<E> {
    fn action_space(&self) -> &DynSpace { (**self).action_space() }
    fn observation_space(&self) -> &DynSpace { (**self).observation_space() }
    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> { (**self).reset(seed) }
    fn step(&mut self, action: Value) -> Result<Step> { (**self).step(action) }
    fn close(&mut self) { (**self).close() }
}
