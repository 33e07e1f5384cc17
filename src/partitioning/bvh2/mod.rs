pub use bvh2_builder::{Bvh2BuildError, Bvh2BuildOptions, Bvh2Builder, Bvh2Level};
pub use bvh2_node::Bvh2Node;
pub(crate) use bvh2_sah::ObjectSplit;

mod bvh2_build;
mod bvh2_builder;
mod bvh2_node;
mod bvh2_partition;
mod bvh2_sah;
mod bvh2_validation;
