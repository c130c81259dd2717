pub mod cluster_dataset;

pub use cluster_dataset::*;
