pub mod progress;
pub mod spring;

pub use progress::*;
pub use spring::*;
