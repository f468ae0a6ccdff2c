// Wrappers module: lambda wrappers over actions, observations and rewards.
//
// Every wrapper owns its inner environment, derives its spaces once in `new`, and rewrites
// values on each `reset`/`step`:
// - LambdaAction, ClipActions, ScaleActions
// - LambdaObservation, ReshapeObservations, ResizeObservations, GrayscaleObservations,
//   ObservationsDtype, FilterObservations, FlattenObservations
// - LambdaReward, ClipRewards

pub mod lambda_action;
pub mod lambda_observation;
pub mod lambda_reward;

use crate::core::Result;
use crate::spaces::Value;

/// A leaf function as a plain function pointer, for wrappers whose type must be nameable.
pub type LeafFn<L> = fn(Value, Option<&L>) -> Result<Value>;

pub use lambda_action::{ClipActions, LambdaAction, ScaleActions};
pub use lambda_observation::{
    FilterObservations, FlattenObservations, GrayscaleObservations, LambdaObservation, ObservationsDtype,
    ReshapeObservations, ResizeObservations,
};
pub use lambda_reward::{ClipRewards, LambdaReward};
