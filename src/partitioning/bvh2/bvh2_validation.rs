use super::Bvh2Builder;
use crate::bounding_volume::{Aabb, BoundingVolume};
use alloc::{vec, vec::Vec};

impl Bvh2Builder {
    /// Counts the number of leaves that can be reached from the node at slot `id`.
    ///
    /// This is mostly a utility for debugging.
    pub fn reachable_leaf_count(&self, id: u32) -> u32 {
        let nodes = self.nodes();
        if id as usize >= nodes.len() {
            return 0;
        }

        let mut count = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            match nodes[id as usize].children() {
                Some([left, right]) => {
                    stack.push(right);
                    stack.push(left);
                }
                None if nodes[id as usize].is_leaf() => count += 1,
                None => {}
            }
        }
        count
    }

    /// Panics if the tree isn’t well-formed.
    ///
    /// The tree is well-formed if it is topologically correct (children indices are valid and
    /// every slot but the padding slot 1 is reached exactly once), every leaf holds exactly one
    /// primitive, the leaves cover every position of the final permutation exactly once, and
    /// the AABB of every internal node is the union of the AABBs of its children.
    pub fn assert_well_formed(&self) {
        if self.is_empty() {
            return;
        }

        let nodes = self.nodes();
        let prim_count = self.capacity();
        let mut visited = vec![false; nodes.len()];
        let mut covered = vec![false; prim_count];
        let mut stack = vec![0u32];

        while let Some(id) = stack.pop() {
            assert!(
                !core::mem::replace(&mut visited[id as usize], true),
                "Detected loop. Node {} visited twice.",
                id
            );
            let node = &nodes[id as usize];

            if let Some([left, right]) = node.children() {
                assert_eq!(left % 2, 0, "sibling pairs must start at even slots");
                assert!(left >= 2 && (right as usize) < nodes.len());
                let merged = nodes[left as usize].aabb.merged(&nodes[right as usize].aabb);
                assert_eq!(node.aabb, merged, "node {} isn’t the union of its children", id);
                stack.push(right);
                stack.push(left);
            } else {
                assert_eq!(node.count, 1, "every leaf must hold a single primitive");
                let position = node.left as usize;
                assert!(position < prim_count);
                assert!(
                    !core::mem::replace(&mut covered[position], true),
                    "position {} is referenced by two leaves",
                    position
                );
            }
        }

        if nodes.len() > 1 {
            assert!(nodes[1].is_unused(), "the padding slot 1 must not be written");
            assert!(nodes[1].children().is_none());
        }

        let reached = visited.iter().filter(|v| **v).count();
        assert_eq!(reached as u32, self.node_count());
        assert!(covered.iter().all(|c| *c), "some primitives aren’t in any leaf");

        let mut primitives = self.primitive_indices().to_vec();
        primitives.sort_unstable();
        assert!(primitives.iter().enumerate().all(|(i, p)| i as u32 == *p));
    }

    /// Panics if any primitive isn’t enclosed by the AABB of every node on the path from the
    /// root to its leaf.
    ///
    /// `primitives` must be the AABBs the tree was built from.
    pub fn assert_encloses(&self, primitives: &[Aabb]) {
        assert_eq!(primitives.len(), self.capacity());

        if self.is_empty() {
            return;
        }

        let nodes = self.nodes();
        let indices = self.primitive_indices();
        // Containment is transitive: checking each node against its parent is enough.
        let mut stack: Vec<(u32, Aabb)> = vec![(0, nodes[0].aabb)];

        while let Some((id, parent_aabb)) = stack.pop() {
            let node = &nodes[id as usize];
            assert!(parent_aabb.contains(&node.aabb));

            match node.children() {
                Some([left, right]) => {
                    stack.push((right, node.aabb));
                    stack.push((left, node.aabb));
                }
                None => {
                    for &prim in &indices[node.leaf_range().unwrap_or(0..0)] {
                        assert!(
                            node.aabb.contains(&primitives[prim as usize]),
                            "leaf {} doesn’t enclose primitive {}",
                            id,
                            prim
                        );
                    }
                }
            }
        }
    }

    /// Panics if the node pairs were not allocated in depth-first order.
    ///
    /// Visiting the tree depth-first, left child first, the children of successive internal
    /// nodes must occupy the successive pairs of slots `(2, 3)`, `(4, 5)`, etc.
    pub fn assert_is_depth_first(&self) {
        if self.is_empty() {
            return;
        }

        let nodes = self.nodes();
        let mut expected_pair = 2;
        let mut stack = vec![0u32];

        while let Some(id) = stack.pop() {
            if let Some([left, right]) = nodes[id as usize].children() {
                assert_eq!(left, expected_pair);
                expected_pair += 2;
                stack.push(right);
                stack.push(left);
            }
        }

        if expected_pair == 2 {
            assert_eq!(self.slot_count(), 1, "a lone root must not allocate any pair");
        } else {
            assert_eq!(expected_pair, self.slot_count());
        }
    }
}
