use crate::core::{Env, Info, InfoValue, Result, Step};
use crate::spaces::{DynSpace, Space, Value};
use crate::utils::action_validator::validate_action;
use crate::utils::rng::{RngStream, SeedSequence, rng_from_seed};

/// Environment with configurable spaces for exercising wrappers.
///
/// Observations are samples of the observation space, or the executed action itself for an
/// echo environment. Every step records the action it received under `info["action"]`.
/// Episodes never end.
pub struct TestingEnv {
    action_space: DynSpace,
    observation_space: DynSpace,
    reward: f32,
    echo: bool,
    validate: bool,
    rng: RngStream,
}

impl TestingEnv {
    pub fn new(action_space: DynSpace, observation_space: DynSpace) -> Self {
        Self {
            action_space,
            observation_space,
            reward: 0.0,
            echo: false,
            validate: false,
            rng: SeedSequence::new(1_234_567).next_rng(),
        }
    }

    /// An environment whose observation after `step` is the action it executed.
    pub fn echo(space: DynSpace) -> Self {
        Self { echo: true, ..Self::new(space.clone(), space) }
    }

    /// Constant reward returned by every step.
    pub fn with_reward(mut self, reward: f32) -> Self {
        self.reward = reward;
        self
    }

    /// Reject actions outside the action space with `InvalidAction`.
    pub fn with_action_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

impl Env for TestingEnv {
    fn action_space(&self) -> &DynSpace { &self.action_space }
    fn observation_space(&self) -> &DynSpace { &self.observation_space }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Value, Info)> {
        if let Some(s) = seed {
            self.rng = rng_from_seed(s);
        }
        Ok((self.observation_space.sample(&mut self.rng), Info::new()))
    }

    fn step(&mut self, action: Value) -> Result<Step> {
        if self.validate {
            validate_action(&self.action_space, &action)?;
        }
        let mut info = Info::new();
        info.insert("action", InfoValue::from(action.clone()));
        let observation = if self.echo { action } else { self.observation_space.sample(&mut self.rng) };
        Ok(Step::new(observation, self.reward, false, false, info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GymError;
    use crate::spaces::{BoxSpace, Discrete};

    #[test]
    fn echo_returns_action() {
        let mut env = TestingEnv::echo(BoxSpace::uniform(-1.0, 1.0, &[4]).into());
        let (obs, _) = env.reset(Some(0)).unwrap();
        assert!(env.observation_space().contains(&obs));
        let step = env.step(Value::f32s(&[1.0; 4])).unwrap();
        assert_eq!(step.observation, Value::f32s(&[1.0; 4]));
        assert_eq!(step.info.get("action").and_then(InfoValue::as_value), Some(&Value::f32s(&[1.0; 4])));
    }

    #[test]
    fn reset_seed_is_reproducible() {
        let mut env = TestingEnv::new(Discrete::new(2).into(), BoxSpace::uniform(0.0, 1.0, &[8]).into());
        let (a, _) = env.reset(Some(3)).unwrap();
        let (b, _) = env.reset(Some(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn validation_rejects_foreign_actions() {
        let mut env = TestingEnv::new(Discrete::new(2).into(), Discrete::new(2).into()).with_action_validation(true);
        assert!(matches!(env.step(Value::Discrete(5)), Err(GymError::InvalidAction(_))));
        assert!(env.step(Value::Discrete(1)).is_ok());
    }
}
