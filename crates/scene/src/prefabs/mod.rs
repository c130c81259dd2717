pub mod axes;

pub use axes::*;
