mod shape;
mod transform;

pub use shape::*;
pub use transform::*;
