//! Mondrian-process partitions of a bounded feature space, used as
//! piecewise-constant regressors that also decide where the next labels go.

pub mod active_learning;
pub mod config;
pub mod core;
pub mod error;
pub mod mondrian;
pub mod warning;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use crate::active_learning::{RoundingPolicy, WeightMode};
pub use crate::config::TreeConfig;
pub use crate::core::Region;
pub use crate::error::MondrianError;
pub use crate::mondrian::{Membership, MondrianTree, suggested_life_time};
pub use crate::warning::{Outcome, Prediction, UniformReason, Warning};
