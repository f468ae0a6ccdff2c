pub mod testing;

pub use testing::TestingEnv;
