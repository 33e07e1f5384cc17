use crate::bounding_volume::Aabb;
use core::ops::Range;

/// A node (internal or leaf) of a binary BVH stored in a flat array.
///
/// - A leaf has a non-zero [`Self::count`]; [`Self::left`] is then the position of its first
///   primitive in [`super::Bvh2Builder::primitive_indices`].
/// - An internal node has `count == 0`; its two children are stored at the consecutive slots
///   `left` and `left + 1`.
///
/// The layout is `#[repr(C)]` with 32 bytes per node so the node array can be uploaded as-is
/// to a GPU buffer.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "bytemuck-serialize",
    derive(bytemuck::Pod, bytemuck::Zeroable)
)]
pub struct Bvh2Node {
    pub(super) aabb: Aabb,
    pub(super) left: u32,
    pub(super) count: u32,
}

static_assertions::assert_eq_size!(Bvh2Node, [u32; 8]);

/// The `left` value of a slot that was never written, e.g., the padding slot 1.
const UNUSED_SLOT: u32 = u32::MAX;

impl Default for Bvh2Node {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bvh2Node {
    /// A node that has not been written yet: empty AABB, no children, no primitive.
    #[inline(always)]
    pub fn empty() -> Self {
        Self {
            aabb: Aabb::new_invalid(),
            left: UNUSED_SLOT,
            count: 0,
        }
    }

    /// Initializes a leaf holding `count` primitives starting at position `first`.
    #[inline(always)]
    pub fn leaf(aabb: Aabb, first: u32, count: u32) -> Self {
        assert!(count > 0, "a leaf must contain at least one primitive");
        Self {
            aabb,
            left: first,
            count,
        }
    }

    /// Initializes an internal node whose children are at `left` and `left + 1`.
    #[inline(always)]
    pub fn internal(aabb: Aabb, left: u32) -> Self {
        Self {
            aabb,
            left,
            count: 0,
        }
    }

    /// Is this slot unused, i.e., neither a leaf nor an internal node?
    ///
    /// This is the case of the padding slot 1 of [`super::Bvh2Builder::nodes`].
    #[inline(always)]
    pub fn is_unused(&self) -> bool {
        self.count == 0 && self.left == UNUSED_SLOT
    }

    /// Is this node a leaf?
    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.count > 0
    }

    /// This node’s AABB.
    #[inline]
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// The raw `left` field: first child slot, or first primitive position for leaves.
    #[inline]
    pub fn left(&self) -> u32 {
        self.left
    }

    /// The number of primitives of this leaf, or zero for internal nodes.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The slots of both children if this node is internal.
    ///
    /// Returns `None` for leaves and unused slots.
    #[inline]
    pub fn children(&self) -> Option<[u32; 2]> {
        (!self.is_leaf() && !self.is_unused()).then_some([self.left, self.left + 1])
    }

    /// The range of positions of this leaf's primitives in the final permutation.
    #[inline]
    pub fn leaf_range(&self) -> Option<Range<usize>> {
        self.is_leaf()
            .then(|| self.left as usize..self.left as usize + self.count as usize)
    }
}
