pub mod axes;
pub mod point_cloud;
pub mod sprite;
pub mod transform;

pub use axes::*;
pub use point_cloud::*;
pub use sprite::*;
pub use transform::*;
