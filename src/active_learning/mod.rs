mod engine;
mod rounding;

pub use engine::WeightMode;
pub use rounding::{RoundingPolicy, apportion_with_capacity};
