use super::bvh2_build::Bvh2Buffers;
use super::ObjectSplit;
use crate::math::DIM;

impl Bvh2Buffers {
    /// Flags every primitive of the split axis range with the side it ends up on.
    pub(super) fn mark_sides(&mut self, split: &ObjectSplit, first: usize, count: usize) {
        let start = split.axis * self.prim_count;
        for i in first..first + count {
            let index = self.axis_indices[start + i];
            self.goes_left[index as usize] = i < split.index;
        }
    }

    /// Partitions the orderings of the two axes that were not split, following the side flags.
    ///
    /// Each side keeps the relative order it had in its axis ordering, so every ordering stays
    /// sorted within both child ranges.
    pub(super) fn partition_other_axes(&mut self, split: &ObjectSplit, first: usize, count: usize) {
        let left_count = split.index - first;

        for axis in (0..DIM).filter(|axis| *axis != split.axis) {
            let start = axis * self.prim_count + first;
            let range = start..start + count;
            let scratch = &mut self.final_indices[..count];
            let mut left = 0;
            let mut right = left_count;

            for &index in &self.axis_indices[range.clone()] {
                if self.goes_left[index as usize] {
                    scratch[left] = index;
                    left += 1;
                } else {
                    scratch[right] = index;
                    right += 1;
                }
            }

            debug_assert_eq!(left, left_count);
            debug_assert_eq!(right, count);
            self.axis_indices[range].copy_from_slice(scratch);
        }
    }
}
