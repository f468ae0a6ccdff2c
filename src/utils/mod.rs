pub mod action_validator;
pub mod rng;

pub use action_validator::validate_action;
pub use rng::{RngStream, SeedSequence, rng_from_seed};
