//! Stable least-significant-digit radix sort of indices keyed by floats.

use crate::bounding_volume::Aabb;
use crate::math::Real;
use alloc::{vec, vec::Vec};

/// Number of key bits consumed by each counting pass.
pub const RADIX_BITS: u32 = 11;
/// Number of buckets of each counting pass.
pub const RADIX_BUCKETS: usize = 1 << RADIX_BITS;
/// Number of counting passes needed to cover a 32-bit key.
pub const RADIX_PASSES: usize = 3;
/// Length of the prefix-sum buffer: one histogram per pass.
pub const RADIX_PREFIX_LEN: usize = RADIX_BUCKETS * RADIX_PASSES;

const DIGIT_MASK: u32 = (RADIX_BUCKETS - 1) as u32;

/// Maps a float to an unsigned integer with the same ordering.
///
/// Non-negative floats get their sign bit set, negative floats get all their bits flipped, so
/// that comparing the results as `u32` matches comparing the inputs as floats. `-0.0` and
/// `+0.0` map to the same key.
#[inline]
pub fn sortable_key(value: Real) -> u32 {
    // Adding zero turns `-0.0` into `+0.0` and leaves every other value unchanged.
    let bits = (value + 0.0).to_bits();
    if bits & 0x8000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000
    }
}

#[inline(always)]
fn digit(key: u32, pass: usize) -> usize {
    ((key >> (pass as u32 * RADIX_BITS)) & DIGIT_MASK) as usize
}

/// A counting sort over float keys, reusing its prefix-sum buffer across calls.
///
/// The sort is stable: indices with equal keys keep the relative order they had in the input.
#[derive(Clone, Debug)]
pub struct RadixSorter {
    prefix: Vec<u32>,
}

impl Default for RadixSorter {
    fn default() -> Self {
        Self::new()
    }
}

impl RadixSorter {
    /// Allocates the prefix-sum buffer.
    pub fn new() -> Self {
        Self {
            prefix: vec![0; RADIX_PREFIX_LEN],
        }
    }

    /// Frees the prefix-sum buffer. Calling this more than once is harmless.
    pub fn release(&mut self) {
        self.prefix = Vec::new();
    }

    /// Is the prefix-sum buffer currently allocated?
    pub fn is_allocated(&self) -> bool {
        self.prefix.len() == RADIX_PREFIX_LEN
    }

    /// Sorts `indices` by `keys[index]`, writing the result into `out`.
    ///
    /// `indices` holds the input order and is clobbered: it serves as the ping-pong buffer of
    /// the intermediate passes. Every element of `indices` must be a valid index into `keys`.
    ///
    /// # Panics
    ///
    /// Panics if `indices` and `out` have different lengths, or if the prefix-sum buffer was
    /// released.
    pub fn sort_by_keys(&mut self, keys: &[Real], indices: &mut [u32], out: &mut [u32]) {
        assert_eq!(indices.len(), out.len());
        assert!(
            self.is_allocated(),
            "the radix prefix-sum buffer has been released"
        );

        self.prefix.fill(0);

        for &index in indices.iter() {
            let key = sortable_key(keys[index as usize]);
            for pass in 0..RADIX_PASSES {
                self.prefix[pass * RADIX_BUCKETS + digit(key, pass)] += 1;
            }
        }

        // Turn the histograms into exclusive prefix sums.
        for histogram in self.prefix.chunks_exact_mut(RADIX_BUCKETS) {
            let mut sum = 0;
            for count in histogram.iter_mut() {
                let bucket_len = *count;
                *count = sum;
                sum += bucket_len;
            }
        }

        // Three passes: indices -> out -> indices -> out.
        for pass in 0..RADIX_PASSES {
            let offsets = &mut self.prefix[pass * RADIX_BUCKETS..(pass + 1) * RADIX_BUCKETS];
            let (src, dst): (&[u32], &mut [u32]) = if pass % 2 == 0 {
                (&*indices, &mut *out)
            } else {
                (&*out, &mut *indices)
            };

            for &index in src {
                let bucket = digit(sortable_key(keys[index as usize]), pass);
                dst[offsets[bucket] as usize] = index;
                offsets[bucket] += 1;
            }
        }
    }
}

/// Converts a number of primitives to the `u32` index space of the sort.
fn index_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| {
        panic!("cannot sort {} indices with 32-bit indices", len);
    })
}

/// Returns the permutation of `0..boxes.len()` sorting `boxes` by centroid along `axis`.
///
/// Ties keep their original relative order. This allocates its own buffers; the BVH builder
/// reuses its own through [`RadixSorter::sort_by_keys`] instead.
///
/// # Panics
///
/// Panics if there are more than `u32::MAX` boxes.
pub fn sort_by_axis(boxes: &[Aabb], axis: usize) -> Vec<u32> {
    let keys: Vec<Real> = boxes.iter().map(|aabb| aabb.centroid(axis)).collect();
    let mut indices: Vec<u32> = (0..index_count(boxes.len())).collect();
    let mut out = vec![0; boxes.len()];
    RadixSorter::new().sort_by_keys(&keys, &mut indices, &mut out);
    out
}
