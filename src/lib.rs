/*!
sahbvh3d
========

**sahbvh3d** builds binary bounding volume hierarchies over 3D axis-aligned
bounding boxes using an exact (sweep-based) surface area heuristic.

The same builder serves bottom-level hierarchies (one box per triangle of a mesh)
and top-level hierarchies (one box per object), the latter being rebuildable in
place, without allocation, every time the objects move.

```
use sahbvh3d::bounding_volume::Aabb;
use sahbvh3d::na::Point3;
use sahbvh3d::partitioning::Bvh2Builder;

let boxes: Vec<Aabb> = (0..8)
    .map(|i| {
        let x = i as f32;
        Aabb::new(Point3::new(x, 0.0, 0.0), Point3::new(x + 1.0, 1.0, 1.0))
    })
    .collect();

let bvh = Bvh2Builder::build_bottom_level(&boxes).unwrap();
assert_eq!(bvh.node_count(), 15);
assert_eq!(bvh.root_aabb(), Aabb::new(Point3::origin(), Point3::new(8.0, 1.0, 1.0)));
```
*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![deny(unused_results)]
#![deny(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::module_inception)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(feature = "serde-serialize")]
#[macro_use]
extern crate serde;
#[macro_use]
extern crate approx;

pub extern crate nalgebra as na;

pub mod bounding_volume;
pub mod partitioning;
pub mod utils;

/// Aliases for the mathematical types used by this crate.
pub mod math {
    pub use na::{Point3, Vector3};

    /// The scalar type used throughout this crate.
    ///
    /// The radix sort of the build maps keys bit-wise, so this is fixed to `f32`.
    pub type Real = f32;

    /// The dimension of the space.
    pub const DIM: usize = 3;

    /// The point type.
    pub use Point3 as Point;

    /// The vector type.
    pub use Vector3 as Vector;
}
