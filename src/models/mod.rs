pub mod frame_set;
pub mod product;

pub use frame_set::*;
pub use product::*;
