//! The thirteen size-class upper bounds (spec §3) and the index function
//! free-fit search and insertion both key off.

/// Upper bound (inclusive) of each size class. Class 13 (index 12) has no
/// upper bound; `usize::MAX` stands in for "infinity" in the linear scan
/// `class_of` performs.
pub const CLASS_UPPER_BOUNDS: [usize; 13] = [
    32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65536, usize::MAX,
];

pub const NUM_CLASSES: usize = CLASS_UPPER_BOUNDS.len();

/// Returns the class index (`0..NUM_CLASSES`) whose range contains `size`:
/// the unique `c` such that `min(c) < size <= max(c)`, found by a linear
/// scan over the thresholds (spec §4.1 "Class indexing" — a binary search
/// would also satisfy the invariant, but thirteen classes is too few for
/// that to matter, and the linear scan reads closer to the original).
#[must_use]
pub fn class_of(size: usize) -> usize {
    CLASS_UPPER_BOUNDS
        .iter()
        .position(|&bound| size <= bound)
        .unwrap_or(NUM_CLASSES - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        assert_eq!(class_of(24), 0);
        assert_eq!(class_of(32), 0);
        assert_eq!(class_of(33), 1);
        assert_eq!(class_of(65536), 11);
        assert_eq!(class_of(65537), 12);
        assert_eq!(class_of(10_000_000), 12);
    }
}
