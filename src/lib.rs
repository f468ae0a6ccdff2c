pub mod core;
pub mod spaces;
pub mod transform;
pub mod utils;
pub mod envs;
pub mod wrappers;

pub use crate::core::{Env, GymError, Info, InfoValue, Result, Step};
pub use crate::spaces::utils::{apply_function, flatdim, flatten, flatten_space};
pub use crate::spaces::{BoxSpace, DType, DictSpace, Discrete, DynSpace, MultiBinary, MultiDiscrete, NdArray, Space, TupleSpace, Value};
pub use crate::transform::{ArgTree, Bounds, RescaleArgs, transform_space};
pub use crate::envs::TestingEnv;
pub use crate::wrappers::{
    ClipActions, ClipRewards, FilterObservations, FlattenObservations, GrayscaleObservations, LambdaAction,
    LambdaObservation, LambdaReward, ObservationsDtype, ReshapeObservations, ResizeObservations, ScaleActions,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// A tiny dummy environment to validate the trait compiles and basic methods work.
    struct CounterEnv {
        state: i64,
        space: DynSpace,
    }

    impl Env for CounterEnv {
        fn action_space(&self) -> &DynSpace { &self.space }
        fn observation_space(&self) -> &DynSpace { &self.space }

        fn reset(&mut self, _seed: Option<u64>) -> Result<(Value, Info)> {
            self.state = 0;
            Ok((Value::Discrete(self.state), Info::new()))
        }

        fn step(&mut self, action: Value) -> Result<Step> {
            let a = action
                .as_discrete()
                .ok_or_else(|| GymError::InvalidAction(format!("expected an int, got {}", action.kind())))?;
            self.state += a;
            let terminated = self.state >= 3;
            Ok(Step::new(Value::Discrete(self.state.min(9)), 1.0, terminated, false, Info::new()))
        }
    }

    #[test]
    fn dummy_env_runs() {
        let mut env = CounterEnv { state: 0, space: Discrete::new(10).into() };
        let (obs, _info) = env.reset(None).unwrap();
        assert_eq!(obs, Value::Discrete(0));
        let s1 = env.step(Value::Discrete(1)).unwrap();
        assert_eq!(s1.observation, Value::Discrete(1));
        assert!(!s1.terminated);
        let s2 = env.step(Value::Discrete(2)).unwrap();
        assert!(s2.terminated);
        assert!(matches!(env.step(Value::f32s(&[1.0])), Err(GymError::InvalidAction(_))));
        env.close();
    }

    #[test]
    fn wrappers_stack_over_boxed_env() {
        let env: Box<dyn Env> = Box::new(CounterEnv { state: 0, space: Discrete::new(10).into() });
        let env = LambdaReward::new(env, |r| r * 2.0);
        let mut env = ClipRewards::new(env, Some(0.0), Some(1.5)).unwrap();
        env.reset(None).unwrap();
        assert_eq!(env.step(Value::Discrete(1)).unwrap().reward, 1.5);
    }
}
