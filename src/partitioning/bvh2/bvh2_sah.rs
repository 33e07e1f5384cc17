use super::bvh2_build::Bvh2Buffers;
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Real, DIM};

/// The best object split of a range of primitives, according to the surface area heuristic.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct ObjectSplit {
    /// The axis whose ordering is split.
    pub(crate) axis: usize,
    /// The absolute position of the first primitive of the right side.
    pub(crate) index: usize,
    /// `SA(left) * left_count + SA(right) * right_count`, with `SA` the half area.
    pub(crate) cost: Real,
    /// The union of the primitives on the left side.
    pub(crate) aabb_left: Aabb,
    /// The union of the primitives on the right side.
    pub(crate) aabb_right: Aabb,
}

/// The best candidate found so far. Candidates are ranked by `(cost, axis, position)`.
struct BestSplit {
    cost: Real,
    axis: Option<usize>,
    position: usize,
    aabb_right: Aabb,
}

impl BestSplit {
    /// Does a candidate with this cost on `axis` rank before the current best?
    ///
    /// Positions of an axis are visited in decreasing order, so an equal cost on the same axis
    /// always comes from a lower position.
    #[inline(always)]
    fn is_beaten_by(&self, cost: Real, axis: usize) -> bool {
        cost < self.cost || (cost == self.cost && self.axis == Some(axis))
    }
}

impl Bvh2Buffers {
    /// Finds the split of the node range `[first, first + count)` with the lowest SAH cost over
    /// all three axis orderings.
    ///
    /// For each axis, an ascending sweep stores the cost of every prefix into `self.costs`,
    /// then a descending sweep adds the cost of every suffix. With `early_termination`, each
    /// sweep stops as soon as its partial cost (a lower bound of the full cost of every
    /// remaining position, since costs never decrease as boxes grow) cannot beat the best
    /// split. This never changes the chosen split.
    pub(super) fn find_object_split(
        &mut self,
        primitives: &[Aabb],
        first: usize,
        count: usize,
        early_termination: bool,
    ) -> ObjectSplit {
        assert!(count > 1, "cannot split a range with less than two primitives");

        let prim_count = self.prim_count;
        let mut best = BestSplit {
            cost: Real::INFINITY,
            axis: None,
            position: 0,
            aabb_right: Aabb::new_invalid(),
        };

        for axis in 0..DIM {
            let start = axis * prim_count + first;
            let order = &self.axis_indices[start..start + count];
            let costs = &mut self.costs[..count];

            // Positions in `[1, valid_end)` have their prefix cost stored in `costs`.
            let mut valid_end = count;
            let mut prefix = Aabb::new_invalid();

            for k in 1..count {
                prefix.merge(&primitives[order[k - 1] as usize]);
                let prefix_cost = prefix.half_area() * k as Real;

                if early_termination && !best.is_beaten_by(prefix_cost, axis) {
                    valid_end = k;
                    break;
                }

                costs[k] = prefix_cost;
            }

            let mut suffix = Aabb::new_invalid();

            for k in (1..count).rev() {
                suffix.merge(&primitives[order[k] as usize]);

                if k >= valid_end {
                    continue;
                }

                let suffix_cost = suffix.half_area() * (count - k) as Real;

                if early_termination && !best.is_beaten_by(suffix_cost, axis) {
                    break;
                }

                let cost = costs[k] + suffix_cost;

                if best.is_beaten_by(cost, axis) {
                    best = BestSplit {
                        cost,
                        axis: Some(axis),
                        position: k,
                        aabb_right: suffix,
                    };
                }
            }
        }

        let Some(axis) = best.axis else {
            return self.median_split(primitives, first, count);
        };

        let start = axis * prim_count + first;
        let mut aabb_left = Aabb::new_invalid();
        for &i in &self.axis_indices[start..start + best.position] {
            aabb_left.merge(&primitives[i as usize]);
        }

        ObjectSplit {
            axis,
            index: first + best.position,
            cost: best.cost,
            aabb_left,
            aabb_right: best.aabb_right,
        }
    }

    /// Splits the range in two halves along the first axis.
    ///
    /// Only reached when no candidate has a finite cost, e.g., with infinite extents.
    fn median_split(&self, primitives: &[Aabb], first: usize, count: usize) -> ObjectSplit {
        log::warn!(
            "No finite SAH cost for the {} primitives starting at {}. Falling back to a median split.",
            count,
            first
        );

        let mid = count / 2;
        let order = &self.axis_indices[first..first + count];
        let mut aabb_left = Aabb::new_invalid();
        let mut aabb_right = Aabb::new_invalid();

        for &i in &order[..mid] {
            aabb_left.merge(&primitives[i as usize]);
        }
        for &i in &order[mid..] {
            aabb_right.merge(&primitives[i as usize]);
        }

        ObjectSplit {
            axis: 0,
            index: first + mid,
            cost: Real::INFINITY,
            aabb_left,
            aabb_right,
        }
    }
}
