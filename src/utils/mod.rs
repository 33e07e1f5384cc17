//! Various sorting utilities used by the hierarchy builders.

pub use self::radix_sort::{
    sort_by_axis, sortable_key, RadixSorter, RADIX_BITS, RADIX_BUCKETS, RADIX_PASSES,
    RADIX_PREFIX_LEN,
};

mod radix_sort;
