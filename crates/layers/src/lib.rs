pub mod clusters;
pub mod labels;

pub use clusters::*;
pub use labels::*;
