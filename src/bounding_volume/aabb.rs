//! Axis Aligned Bounding Box.

use crate::bounding_volume::BoundingVolume;
use crate::math::{Point, Real, Vector, DIM};
use approx::{AbsDiffEq, RelativeEq};

/// An Axis-Aligned Bounding Box (AABB).
///
/// An AABB is defined by its minimum and maximum corners. Its edges are always parallel to
/// the coordinate axes, which makes unions and containment tests a handful of component-wise
/// comparisons.
///
/// # Structure
///
/// - **mins**: The point with the smallest coordinates on each axis.
/// - **maxs**: The point with the largest coordinates on each axis.
/// - **Invariant**: `mins.x ≤ maxs.x`, `mins.y ≤ maxs.y` and `mins.z ≤ maxs.z`, except for
///   the empty AABB returned by [`Aabb::new_invalid`] which has `mins = +∞` and `maxs = -∞`
///   and acts as the identity of [`BoundingVolume::merge`].
///
/// # Example
///
/// ```rust
/// use sahbvh3d::bounding_volume::{Aabb, BoundingVolume};
/// use sahbvh3d::na::Point3;
///
/// let mut union = Aabb::new_invalid();
/// union.merge(&Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)));
/// union.merge(&Aabb::new(Point3::new(2.0, -1.0, 0.0), Point3::new(3.0, 0.0, 1.0)));
///
/// assert_eq!(union.mins, Point3::new(0.0, -1.0, 0.0));
/// assert_eq!(union.maxs, Point3::new(3.0, 1.0, 1.0));
/// ```
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "bytemuck-serialize",
    derive(bytemuck::Pod, bytemuck::Zeroable)
)]
#[derive(Debug, PartialEq, Copy, Clone)]
#[repr(C)]
pub struct Aabb {
    /// The point with minimum coordinates.
    pub mins: Point<Real>,
    /// The point with maximum coordinates.
    pub maxs: Point<Real>,
}

impl Default for Aabb {
    /// The empty AABB, see [`Aabb::new_invalid`].
    fn default() -> Self {
        Self::new_invalid()
    }
}

impl Aabb {
    /// Creates a new AABB from its minimum and maximum corners.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sahbvh3d::bounding_volume::Aabb;
    /// use sahbvh3d::na::{Point3, Vector3};
    ///
    /// let aabb = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
    /// assert_eq!(aabb.center(), Point3::origin());
    /// assert_eq!(aabb.extents(), Vector3::new(2.0, 2.0, 2.0));
    /// ```
    #[inline]
    pub fn new(mins: Point<Real>, maxs: Point<Real>) -> Aabb {
        Aabb { mins, maxs }
    }

    /// Creates the empty AABB with inverted, infinite, bounds.
    ///
    /// Merging any AABB into it yields that AABB unchanged, which makes it the natural
    /// starting point of a running union.
    #[inline]
    pub fn new_invalid() -> Self {
        Self::new(
            Vector::repeat(Real::INFINITY).into(),
            Vector::repeat(Real::NEG_INFINITY).into(),
        )
    }

    /// Creates a new AABB from its center and half-extents.
    #[inline]
    pub fn from_half_extents(center: Point<Real>, half_extents: Vector<Real>) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Creates the smallest AABB enclosing all the given points.
    ///
    /// Returns the empty AABB if the iterator yields nothing.
    pub fn from_points<I>(pts: I) -> Self
    where
        I: IntoIterator<Item = Point<Real>>,
    {
        let mut result = Self::new_invalid();
        for pt in pts {
            result.take_point(pt);
        }
        result
    }

    /// Is this AABB empty, i.e., are its bounds inverted along at least one axis?
    #[inline]
    pub fn is_empty(&self) -> bool {
        (0..DIM).any(|i| self.mins[i] > self.maxs[i])
    }

    /// Returns the center point of this AABB.
    #[inline]
    pub fn center(&self) -> Point<Real> {
        na::center(&self.mins, &self.maxs)
    }

    /// The coordinate of the center of this AABB along the given axis.
    ///
    /// This is the key used to order primitives along each axis when building a BVH.
    #[inline]
    pub fn centroid(&self, axis: usize) -> Real {
        (self.maxs[axis] + self.mins[axis]) * 0.5
    }

    /// Returns the half-extents of this AABB.
    #[inline]
    pub fn half_extents(&self) -> Vector<Real> {
        (self.maxs - self.mins) * 0.5
    }

    /// The extents of this `Aabb`.
    #[inline]
    pub fn extents(&self) -> Vector<Real> {
        self.maxs - self.mins
    }

    /// The half area of this `Aabb`, i.e., `(dx + dy) * dz + dx * dy`.
    ///
    /// This is the surface-area measure of the SAH cost. It is non-decreasing as the
    /// AABB grows and never involves a division.
    #[inline]
    pub fn half_area(&self) -> Real {
        let extents = self.extents();
        (extents.x + extents.y) * extents.z + extents.x * extents.y
    }

    /// Enlarges this `Aabb` so it also contains the point `pt`.
    pub fn take_point(&mut self, pt: Point<Real>) {
        self.mins = self.mins.coords.inf(&pt.coords).into();
        self.maxs = self.maxs.coords.sup(&pt.coords).into();
    }

    /// Tests if the given point is inside of this AABB (boundary included).
    #[inline]
    pub fn contains_local_point(&self, point: &Point<Real>) -> bool {
        (0..DIM).all(|i| point[i] >= self.mins[i] && point[i] <= self.maxs[i])
    }
}

impl BoundingVolume for Aabb {
    #[inline]
    fn center(&self) -> Point<Real> {
        self.center()
    }

    #[inline]
    fn intersects(&self, other: &Aabb) -> bool {
        na::partial_le(&self.mins, &other.maxs) && na::partial_ge(&self.maxs, &other.mins)
    }

    #[inline]
    fn contains(&self, other: &Aabb) -> bool {
        na::partial_le(&self.mins, &other.mins) && na::partial_ge(&self.maxs, &other.maxs)
    }

    #[inline]
    fn merge(&mut self, other: &Aabb) {
        self.mins = self.mins.inf(&other.mins);
        self.maxs = self.maxs.sup(&other.maxs);
    }

    #[inline]
    fn merged(&self, other: &Aabb) -> Aabb {
        Aabb {
            mins: self.mins.inf(&other.mins),
            maxs: self.maxs.sup(&other.maxs),
        }
    }
}

impl AbsDiffEq for Aabb {
    type Epsilon = Real;

    fn default_epsilon() -> Real {
        Real::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Real) -> bool {
        self.mins.abs_diff_eq(&other.mins, epsilon) && self.maxs.abs_diff_eq(&other.maxs, epsilon)
    }
}

impl RelativeEq for Aabb {
    fn default_max_relative() -> Real {
        Real::default_max_relative()
    }

    fn relative_eq(&self, other: &Self, epsilon: Real, max_relative: Real) -> bool {
        self.mins.relative_eq(&other.mins, epsilon, max_relative)
            && self.maxs.relative_eq(&other.maxs, epsilon, max_relative)
    }
}
