//! Property-based invariant checks: random `alloc`/`free`/`realloc`
//! sequences, validated via `Allocator::check()` after every operation.

use heapcache_alloc::Allocator;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Alloc(usize),
    Free(usize),
    Realloc(usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..2_000).prop_map(Op::Alloc),
        (0usize..32).prop_map(Op::Free),
        (0usize..32, 1usize..2_000).prop_map(|(i, n)| Op::Realloc(i, n)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Items 1-3: after any sequence of alloc/free/realloc, every heap and
    /// free-list invariant the checker knows about still holds.
    #[test]
    fn random_alloc_free_realloc_preserves_invariants(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut allocator = Allocator::with_capacity(16 * 1024 * 1024).unwrap();
        let mut live: Vec<heapcache_alloc::Addr> = Vec::new();

        for op in ops {
            match op {
                Op::Alloc(size) => {
                    if let Some(p) = allocator.alloc(size) {
                        live.push(p);
                    }
                }
                Op::Free(i) => {
                    if !live.is_empty() {
                        let p = live.remove(i % live.len());
                        allocator.free(Some(p));
                    }
                }
                Op::Realloc(i, size) => {
                    if !live.is_empty() {
                        let idx = i % live.len();
                        let p = live[idx];
                        if let Some(new_p) = allocator.realloc(Some(p), size) {
                            live[idx] = new_p;
                        } else {
                            live.remove(idx);
                        }
                    }
                }
            }
            prop_assert!(allocator.check().is_ok());
        }
    }

    /// Item 4: a freshly allocated block is aligned, in-bounds, and a write
    /// to its payload round-trips through a read before any intervening
    /// free or realloc.
    #[test]
    fn fresh_allocation_is_aligned_in_bounds_and_round_trips(size in 1usize..4_096, fill in any::<u8>()) {
        let mut allocator = Allocator::with_capacity(16 * 1024 * 1024).unwrap();
        let p = allocator.alloc(size).unwrap();
        let (lo, hi) = allocator.bounds();

        prop_assert_eq!(p.as_usize() % 8, 0);
        prop_assert!(p.as_usize() >= lo.as_usize() && p.as_usize() < hi.as_usize());

        allocator.payload_mut(p, size).fill(fill);
        prop_assert!(allocator.payload(p, size).iter().all(|&b| b == fill));
    }

    /// Item 5: realloc preserves `min(old_usable_size - 8, n)` payload
    /// bytes, whether it grows in place or falls back to a fresh
    /// allocation.
    #[test]
    fn realloc_preserves_old_payload_prefix(first in 8usize..256, grow_by in 0usize..8_192) {
        let mut allocator = Allocator::with_capacity(16 * 1024 * 1024).unwrap();
        let p = allocator.alloc(first).unwrap();

        let pattern: Vec<u8> = (0..first).map(|i| (i % 256) as u8).collect();
        allocator.payload_mut(p, first).copy_from_slice(&pattern);

        let new_size = first + grow_by;
        let p2 = allocator.realloc(Some(p), new_size).unwrap();

        // first's block is at least `first` bytes of usable payload; after
        // growth the whole original prefix must be intact.
        prop_assert_eq!(allocator.payload(p2, first), &pattern[..]);
        allocator.check().unwrap();
    }
}
