pub mod crash;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

mod fixed;

pub use fixed::{Multiplier, SCALE};
