//! Spatial partitioning tools.

pub use bvh2::{Bvh2BuildError, Bvh2BuildOptions, Bvh2Builder, Bvh2Level, Bvh2Node};

mod bvh2;
