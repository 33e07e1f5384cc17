use super::bvh2_build::Bvh2Buffers;
use super::Bvh2Node;
use crate::bounding_volume::Aabb;
use alloc::vec::Vec;

/// Indicates that a BVH could not be built or rebuilt from the given primitives.
///
/// All of these are usage errors detected before any buffer is modified.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bvh2BuildError {
    /// A BVH must contain at least one primitive.
    #[error("a BVH must contain at least one primitive")]
    EmptyPrimitives,
    /// The number of primitives is too large for the 32-bit node and primitive indices.
    #[error("{0} primitives exceed the maximum supported by 32-bit node indices")]
    TooManyPrimitives(usize),
    /// A rebuild was attempted with a number of primitives different from the one the
    /// buffers were allocated for.
    #[error("the BVH buffers were allocated for {expected} primitives but {found} were given")]
    PrimitiveCountMismatch {
        /// The number of primitives the buffers were allocated for.
        expected: usize,
        /// The number of primitives given to the rebuild.
        found: usize,
    },
    /// A rebuild was attempted after the build buffers were released, either explicitly or
    /// because the BVH was built as a bottom-level structure.
    #[error("the BVH build buffers have been released")]
    BuffersReleased,
}

/// Runtime options of the BVH construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Bvh2BuildOptions {
    /// Stop the SAH sweeps as soon as their partial cost proves that no better split can be
    /// found along the remaining positions.
    ///
    /// This only speeds up the split search: the resulting tree is the same either way.
    pub early_termination: bool,
}

impl Default for Bvh2BuildOptions {
    fn default() -> Self {
        Self {
            early_termination: true,
        }
    }
}

/// The kind of hierarchy a [`Bvh2Builder`] was created for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bvh2Level {
    /// A static hierarchy over the triangles of a single mesh.
    ///
    /// The build scratch buffers are released right after construction.
    BottomLevel,
    /// A hierarchy over per-object bounding boxes that can be rebuilt in place.
    TopLevel,
}

/// A binary BVH built with an exact surface-area heuristic, along with the buffers used to
/// build it.
///
/// The builder owns every buffer of the construction. They are allocated once, sized after
/// the number of primitives, and reused by [`Self::rebuild`] so that a top-level hierarchy can
/// be rebuilt every frame without any allocation.
///
/// The resulting tree is made of:
/// - [`Self::nodes`]: the node slots, root at slot 0, sibling pairs at even slots starting at
///   slot 2. Slot 1 is never written.
/// - [`Self::primitive_indices`]: the permutation mapping the leaf positions to the original
///   primitive indices.
///
/// Every leaf contains exactly one primitive so a tree over `n > 1` primitives has
/// `2n - 1` nodes.
#[derive(Clone, Debug)]
pub struct Bvh2Builder {
    level: Bvh2Level,
    options: Bvh2BuildOptions,
    capacity: usize,
    /// Copy of the top-level primitives. Empty for bottom-level hierarchies.
    primitives: Vec<Aabb>,
    pub(super) buffers: Bvh2Buffers,
}

impl Bvh2Builder {
    /// Builds a static BVH over the AABBs of a mesh's triangles.
    ///
    /// The build scratch buffers are released once the tree is built: only the nodes and the
    /// final permutation are kept, and the result cannot be rebuilt.
    pub fn build_bottom_level(triangles: &[Aabb]) -> Result<Self, Bvh2BuildError> {
        Self::build_bottom_level_with_options(triangles, Bvh2BuildOptions::default())
    }

    /// Same as [`Self::build_bottom_level`] with custom build options.
    pub fn build_bottom_level_with_options(
        triangles: &[Aabb],
        options: Bvh2BuildOptions,
    ) -> Result<Self, Bvh2BuildError> {
        let mut result = Self::allocate(Bvh2Level::BottomLevel, triangles.len(), options)?;
        result.buffers.build(triangles, &result.options);
        result.buffers.release_scratch();
        result.log_build("Built");
        Ok(result)
    }

    /// Builds a BVH over per-object AABBs.
    ///
    /// Every buffer is retained so the tree can later be rebuilt with [`Self::rebuild`].
    pub fn build_top_level(objects: &[Aabb]) -> Result<Self, Bvh2BuildError> {
        Self::build_top_level_with_options(objects, Bvh2BuildOptions::default())
    }

    /// Same as [`Self::build_top_level`] with custom build options.
    pub fn build_top_level_with_options(
        objects: &[Aabb],
        options: Bvh2BuildOptions,
    ) -> Result<Self, Bvh2BuildError> {
        let mut result = Self::allocate(Bvh2Level::TopLevel, objects.len(), options)?;
        result.primitives.extend_from_slice(objects);
        result.buffers.build(&result.primitives, &result.options);
        result.log_build("Built");
        Ok(result)
    }

    fn allocate(
        level: Bvh2Level,
        prim_count: usize,
        options: Bvh2BuildOptions,
    ) -> Result<Self, Bvh2BuildError> {
        if prim_count == 0 {
            return Err(Bvh2BuildError::EmptyPrimitives);
        }

        // Node slots go up to `2 * prim_count` and must fit in a `u32`.
        if prim_count > (u32::MAX / 2) as usize {
            return Err(Bvh2BuildError::TooManyPrimitives(prim_count));
        }

        let primitives = match level {
            Bvh2Level::BottomLevel => Vec::new(),
            Bvh2Level::TopLevel => Vec::with_capacity(prim_count),
        };

        Ok(Self {
            level,
            options,
            capacity: prim_count,
            primitives,
            buffers: Bvh2Buffers::allocate(prim_count),
        })
    }

    /// Rebuilds the whole tree from new per-object AABBs, reusing every buffer.
    ///
    /// This is meant to be called every time the objects move. No allocation happens.
    ///
    /// # Errors
    ///
    /// - [`Bvh2BuildError::BuffersReleased`] if this is a bottom-level hierarchy or if
    ///   [`Self::release`] was called.
    /// - [`Bvh2BuildError::PrimitiveCountMismatch`] if `objects.len()` differs from
    ///   [`Self::capacity`].
    ///
    /// The tree is left untouched if an error is returned.
    pub fn rebuild(&mut self, objects: &[Aabb]) -> Result<(), Bvh2BuildError> {
        if !self.is_rebuildable() {
            return Err(Bvh2BuildError::BuffersReleased);
        }

        if objects.len() != self.capacity {
            return Err(Bvh2BuildError::PrimitiveCountMismatch {
                expected: self.capacity,
                found: objects.len(),
            });
        }

        self.primitives.copy_from_slice(objects);
        self.buffers.build(&self.primitives, &self.options);
        self.log_build("Rebuilt");
        Ok(())
    }

    /// Frees every buffer, including the tree itself.
    ///
    /// This can be called any number of times, in any state. Afterward the tree is empty and
    /// [`Self::rebuild`] fails.
    pub fn release(&mut self) {
        self.buffers.release_all();
        self.primitives = Vec::new();
    }

    fn log_build(&self, verb: &str) {
        log::debug!(
            "{} {:?} BVH over {} primitives: {} nodes.",
            verb,
            self.level,
            self.capacity,
            self.node_count()
        );
    }

    /// Can [`Self::rebuild`] be called on this builder?
    pub fn is_rebuildable(&self) -> bool {
        self.level == Bvh2Level::TopLevel
            && self.primitives.len() == self.capacity
            && self.buffers.has_scratch()
            && self.buffers.nodes.len() == 2 * self.capacity
            && self.buffers.final_indices.len() == self.capacity
    }

    /// The kind of hierarchy this builder was created for.
    pub fn level(&self) -> Bvh2Level {
        self.level
    }

    /// The options used to build this tree.
    pub fn options(&self) -> &Bvh2BuildOptions {
        &self.options
    }

    /// The number of primitives the buffers were allocated for.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Is the tree empty? This only happens after [`Self::release`].
    pub fn is_empty(&self) -> bool {
        self.buffers.slot_count == 0
    }

    /// The node slots written by the last build.
    ///
    /// This has `2n` elements for `n > 1` primitives and a single element for a single
    /// primitive. Sibling pairs start at even slots so slot 1 is padding: it is never written,
    /// [`Bvh2Node::is_unused`] returns `true` for it and it has no children.
    pub fn nodes(&self) -> &[Bvh2Node] {
        &self.buffers.nodes[..self.buffers.slot_count as usize]
    }

    /// The number of node slots, see [`Self::nodes`].
    pub fn slot_count(&self) -> u32 {
        self.buffers.slot_count
    }

    /// The number of nodes of the tree: `2n - 1` for `n` primitives.
    pub fn node_count(&self) -> u32 {
        self.buffers.node_count()
    }

    /// The root node, if the tree is not empty.
    pub fn root(&self) -> Option<&Bvh2Node> {
        self.nodes().first()
    }

    /// The AABB enclosing every primitive.
    ///
    /// Returns the empty AABB if the tree is empty.
    pub fn root_aabb(&self) -> Aabb {
        self.root()
            .map(|root| root.aabb)
            .unwrap_or_else(Aabb::new_invalid)
    }

    /// The permutation from leaf positions to the original primitive indices.
    ///
    /// The leaf at node `i` refers to the primitives `primitive_indices()[nodes()[i].leaf_range()]`.
    pub fn primitive_indices(&self) -> &[u32] {
        &self.buffers.final_indices
    }

    /// The original index of the primitive contained by the leaf at slot `node_id`.
    ///
    /// Returns `None` if `node_id` isn't a leaf.
    pub fn leaf_primitive(&self, node_id: u32) -> Option<u32> {
        let node = self.nodes().get(node_id as usize)?;
        node.is_leaf()
            .then(|| self.buffers.final_indices[node.left as usize])
    }

    /// The primitives (top-level only) the tree was last built from.
    pub fn primitives(&self) -> &[Aabb] {
        &self.primitives
    }

    /// The depth of the sub-tree rooted at the node at slot `node_id`.
    ///
    /// Set `node_id` to 0 to get the depth of the whole tree. A single leaf has a depth of 1,
    /// an unused slot a depth of 0.
    pub fn subtree_depth(&self, node_id: u32) -> u32 {
        let nodes = self.nodes();
        if nodes.get(node_id as usize).map_or(true, |node| node.is_unused()) {
            return 0;
        }

        // Degenerate inputs can make the tree as deep as it has leaves, so avoid recursion.
        let mut max_depth = 0;
        let mut stack = alloc::vec![(node_id, 1)];

        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some([left, right]) = nodes[id as usize].children() {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }

        max_depth
    }

    /// An approximation of the memory usage (in bytes) for this struct plus
    /// the memory it allocates dynamically.
    pub fn total_memory_size(&self) -> usize {
        core::mem::size_of::<Self>() + self.heap_memory_size()
    }

    /// An approximation of the memory dynamically-allocated by this struct.
    pub fn heap_memory_size(&self) -> usize {
        self.primitives.capacity() * core::mem::size_of::<Aabb>()
            + self.buffers.heap_memory_size()
    }
}
