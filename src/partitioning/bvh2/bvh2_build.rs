use super::{Bvh2BuildOptions, Bvh2Node};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Real, DIM};
use crate::utils::RadixSorter;
use alloc::{vec, vec::Vec};

/// A pending node of the top-down build: the slot to fill and its primitive range.
#[derive(Copy, Clone, Debug)]
pub(super) struct Bvh2BuildTask {
    node: u32,
    first: u32,
    count: u32,
}

/// Every buffer needed to build a BVH over `prim_count` primitives.
///
/// All the buffers are sized once, at allocation, so building again over the same number of
/// primitives never allocates.
#[derive(Clone, Debug)]
pub(super) struct Bvh2Buffers {
    pub(super) prim_count: usize,
    /// The node slots. Sibling pairs start at even slots, so slot 1 is never written.
    pub(super) nodes: Vec<Bvh2Node>,
    /// One past the last slot written by the last build.
    pub(super) slot_count: u32,
    /// The three per-axis orderings, `prim_count` indices each.
    pub(super) axis_indices: Vec<u32>,
    /// Scratch indices during the build (radix ping-pong, partition buffer) and the final
    /// leaf-order permutation afterward.
    pub(super) final_indices: Vec<u32>,
    /// Per-primitive side of the split of the node being processed.
    pub(super) goes_left: Vec<bool>,
    /// Running SAH costs of a sweep, or sort keys while sorting the axes.
    pub(super) costs: Vec<Real>,
    pub(super) sorter: RadixSorter,
    pub(super) stack: Vec<Bvh2BuildTask>,
}

/// Releases a buffer if it is still allocated. Returns `true` if something was freed.
fn free<T>(buffer: &mut Vec<T>) -> bool {
    if buffer.capacity() == 0 {
        false
    } else {
        *buffer = Vec::new();
        true
    }
}

impl Bvh2Buffers {
    pub(super) fn allocate(prim_count: usize) -> Self {
        Self {
            prim_count,
            nodes: vec![Bvh2Node::empty(); prim_count * 2],
            slot_count: 0,
            axis_indices: vec![0; prim_count * DIM],
            final_indices: vec![0; prim_count],
            goes_left: vec![false; prim_count],
            costs: vec![0.0; prim_count],
            sorter: RadixSorter::new(),
            // Pending tasks own disjoint non-empty ranges so there are never more than
            // `prim_count` of them.
            stack: Vec::with_capacity(prim_count),
        }
    }

    /// Are all the buffers needed by [`Self::build`] still allocated?
    pub(super) fn has_scratch(&self) -> bool {
        self.axis_indices.len() == self.prim_count * DIM
            && self.goes_left.len() == self.prim_count
            && self.costs.len() == self.prim_count
            && self.sorter.is_allocated()
    }

    /// Frees everything except the nodes and the final permutation.
    pub(super) fn release_scratch(&mut self) {
        let mut freed = free(&mut self.axis_indices);
        freed |= free(&mut self.goes_left);
        freed |= free(&mut self.costs);
        freed |= free(&mut self.stack);
        if self.sorter.is_allocated() {
            self.sorter.release();
            freed = true;
        }

        if freed {
            log::trace!("Released the BVH build scratch buffers.");
        }
    }

    /// Frees every buffer. Harmless on buffers that are already (partially) released.
    pub(super) fn release_all(&mut self) {
        self.release_scratch();
        let mut freed = free(&mut self.nodes);
        freed |= free(&mut self.final_indices);
        self.slot_count = 0;

        if freed {
            log::trace!("Released the BVH nodes and permutation.");
        }
    }

    /// Rebuilds the whole tree over `primitives`.
    ///
    /// `primitives` must contain exactly `self.prim_count` AABBs and the scratch buffers must
    /// be allocated.
    pub(super) fn build(&mut self, primitives: &[Aabb], options: &Bvh2BuildOptions) {
        assert_eq!(primitives.len(), self.prim_count);
        assert!(self.has_scratch());

        self.nodes.fill(Bvh2Node::empty());
        self.sort_axes(primitives);
        self.build_nodes(primitives, options);

        // Every leaf holds a single primitive, so all three orderings are now identical.
        let prim_count = self.prim_count;
        self.final_indices
            .copy_from_slice(&self.axis_indices[..prim_count]);
    }

    /// Sorts the primitive indices by centroid along each axis and computes the root AABB.
    pub(super) fn sort_axes(&mut self, primitives: &[Aabb]) {
        let prim_count = self.prim_count;
        let mut root_aabb = Aabb::new_invalid();

        for axis in 0..DIM {
            for (i, primitive) in primitives.iter().enumerate() {
                self.final_indices[i] = i as u32;
                self.costs[i] = primitive.centroid(axis);

                if axis == 0 {
                    root_aabb.merge(primitive);
                }
            }

            let sorted = &mut self.axis_indices[axis * prim_count..(axis + 1) * prim_count];
            self.sorter
                .sort_by_keys(&self.costs, &mut self.final_indices, sorted);
        }

        self.nodes[0].aabb = root_aabb;
    }

    /// Fills the node slots top-down, in depth-first order.
    ///
    /// Node pairs are allocated in the order the nodes are processed: the left subtree of a
    /// node is fully processed before its right sibling.
    fn build_nodes(&mut self, primitives: &[Aabb], options: &Bvh2BuildOptions) {
        let mut next_slot = 2;

        self.stack.clear();
        self.stack.push(Bvh2BuildTask {
            node: 0,
            first: 0,
            count: self.prim_count as u32,
        });

        while let Some(task) = self.stack.pop() {
            let first = task.first as usize;
            let count = task.count as usize;

            if count == 1 {
                let node = &mut self.nodes[task.node as usize];
                node.left = task.first;
                node.count = 1;
                continue;
            }

            let split = self.find_object_split(primitives, first, count, options.early_termination);
            self.mark_sides(&split, first, count);
            self.partition_other_axes(&split, first, count);

            let left_child = next_slot;
            next_slot += 2;

            let node = &mut self.nodes[task.node as usize];
            node.left = left_child;
            node.count = 0;
            self.nodes[left_child as usize].aabb = split.aabb_left;
            self.nodes[left_child as usize + 1].aabb = split.aabb_right;

            let split_index = split.index as u32;
            self.stack.push(Bvh2BuildTask {
                node: left_child + 1,
                first: split_index,
                count: task.first + task.count - split_index,
            });
            self.stack.push(Bvh2BuildTask {
                node: left_child,
                first: task.first,
                count: split_index - task.first,
            });
        }

        // Without any split, the root is alone and slot 1 isn't part of the tree.
        self.slot_count = if next_slot == 2 { 1 } else { next_slot };
    }

    /// The number of nodes written by the last build.
    pub(super) fn node_count(&self) -> u32 {
        // Every slot but the padding slot 1.
        if self.slot_count > 1 {
            self.slot_count - 1
        } else {
            self.slot_count
        }
    }

    pub(super) fn heap_memory_size(&self) -> usize {
        use core::mem::size_of;

        self.nodes.capacity() * size_of::<Bvh2Node>()
            + self.axis_indices.capacity() * size_of::<u32>()
            + self.final_indices.capacity() * size_of::<u32>()
            + self.goes_left.capacity() * size_of::<bool>()
            + self.costs.capacity() * size_of::<Real>()
            + self.stack.capacity() * size_of::<Bvh2BuildTask>()
            + if self.sorter.is_allocated() {
                crate::utils::RADIX_PREFIX_LEN * size_of::<u32>()
            } else {
                0
            }
    }
}
