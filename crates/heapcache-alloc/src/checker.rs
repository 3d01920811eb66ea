//! Heap consistency checking (spec §4.1 "Checker").
//!
//! Walks the heap forward block-by-block, then walks each size class's free
//! list with hare-and-tortoise cycle detection, then reconciles the two: any
//! free block the forward walk found must appear in exactly one class list,
//! and vice versa.

use std::collections::HashSet;

use thiserror::Error;

use crate::allocator::Allocator;
use crate::block::{Addr, Block};
use crate::classes::{class_of, NUM_CLASSES};

/// A violated heap or free-list invariant, as found by [`Allocator::check`].
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("block at {addr:?} is not doubleword-aligned")]
    Misaligned { addr: Addr },

    #[error("block at {addr:?} of size {size} extends past the heap's used region")]
    OutOfBounds { addr: Addr, size: usize },

    #[error("block at {addr:?} has mismatched header/footer")]
    HeaderFooterMismatch { addr: Addr },

    #[error("block at {addr:?} has size {size}, below the minimum block size")]
    BlockTooSmall { addr: Addr, size: usize },

    #[error("adjacent free blocks at {first:?} and {second:?} were not coalesced")]
    AdjacentFreeBlocks { first: Addr, second: Addr },

    #[error("{which} sentinel at {addr:?} is not marked allocated")]
    SentinelNotAllocated { addr: Addr, which: &'static str },

    #[error("free list for class {class} contains a cycle")]
    ListCycle { class: usize },

    #[error("free list for class {class} contains block at {addr:?}, which is marked allocated")]
    ListMemberNotFree { class: usize, addr: Addr },

    #[error("free list for class {class} contains block at {addr:?} of size {size}, which belongs in a different class")]
    ListMemberWrongClass {
        class: usize,
        addr: Addr,
        size: usize,
    },

    #[error("free list for class {class} has an inconsistent back-link at {addr:?}")]
    ListLinkInconsistent { class: usize, addr: Addr },

    #[error("free list head for class {class} has a non-null back-link")]
    ListHeadHasBackLink { class: usize },

    #[error(
        "heap walk found {heap_walk} free blocks but the free lists contain {list_walk} entries"
    )]
    FreeBlockCountMismatch { heap_walk: usize, list_walk: usize },

    #[error("free block at {addr:?} found by the heap walk is not present in any free list")]
    FreeBlockNotInAnyList { addr: Addr },
}

/// Runs every check in spec §4.1/§8 over `allocator`'s current state.
pub fn check(allocator: &Allocator) -> Result<(), CheckError> {
    let heap_free = walk_heap(allocator)?;
    let list_free = walk_free_lists(allocator)?;

    if heap_free.len() != list_free.len() {
        return Err(CheckError::FreeBlockCountMismatch {
            heap_walk: heap_free.len(),
            list_walk: list_free.len(),
        });
    }
    for addr in &heap_free {
        if !list_free.contains(addr) {
            return Err(CheckError::FreeBlockNotInAnyList { addr: *addr });
        }
    }
    Ok(())
}

/// Forward walk from the first real block (after the prologue) to the
/// epilogue, checking every per-block invariant along the way. Returns the
/// set of free block addresses found.
fn walk_heap(allocator: &Allocator) -> Result<HashSet<Addr>, CheckError> {
    let heap = &allocator.heap;
    let (_, used) = heap.bounds();

    let prologue = Block::at(allocator.prologue);
    if !prologue.is_alloc(heap) {
        return Err(CheckError::SentinelNotAllocated {
            addr: allocator.prologue,
            which: "prologue",
        });
    }

    let mut free_blocks = HashSet::new();
    let mut prev_free_addr: Option<Addr> = None;
    let mut addr = allocator.prologue.add(prologue.size(heap));

    loop {
        let block = Block::at(addr);

        // The alignment invariant is on the payload address a caller gets
        // back from `alloc`, not the header word before it: headers sit at
        // `payload - 4`, i.e. 4 mod 8 under this allocator's layout (see
        // `Allocator::with_capacity`'s padding word). Checking the header's
        // own offset against 0 mod 8 would never catch a real misalignment.
        // Mirrors the original `check_block`'s `(size_t)bp % ALIGNMENT` on
        // the payload pointer `bp`.
        if block.payload_addr().as_usize() % crate::ALIGNMENT != 0 {
            return Err(CheckError::Misaligned { addr });
        }

        if block.is_epilogue(heap) {
            if !block.is_alloc(heap) {
                return Err(CheckError::SentinelNotAllocated {
                    addr,
                    which: "epilogue",
                });
            }
            break;
        }

        let size = block.size(heap);
        if size < crate::MIN_BLOCK_SIZE {
            return Err(CheckError::BlockTooSmall { addr, size });
        }
        if addr.as_usize() + size > used.as_usize() {
            return Err(CheckError::OutOfBounds { addr, size });
        }
        let header = heap.read_u32(addr);
        let footer = heap.read_u32(addr.add(size - 4));
        if header != footer {
            return Err(CheckError::HeaderFooterMismatch { addr });
        }

        let is_free = !block.is_alloc(heap);
        if is_free {
            if let Some(first) = prev_free_addr {
                return Err(CheckError::AdjacentFreeBlocks {
                    first,
                    second: addr,
                });
            }
            free_blocks.insert(addr);
        }
        prev_free_addr = is_free.then_some(addr);

        addr = block.next_block_addr(heap);
    }

    Ok(free_blocks)
}

/// Walks every class's free list with a hare-and-tortoise cycle check,
/// validating each member's alloc bit, size-class membership, and back-link.
/// Returns the set of every free block address found across all classes.
fn walk_free_lists(allocator: &Allocator) -> Result<HashSet<Addr>, CheckError> {
    let heap = &allocator.heap;
    let mut seen = HashSet::new();

    for class in 0..NUM_CLASSES {
        let head = allocator.free_lists.head(class);
        if let Some(head_addr) = head {
            if Block::at(head_addr).prev_free(heap).is_some() {
                return Err(CheckError::ListHeadHasBackLink { class });
            }
        }

        let mut slow = head;
        let mut fast = head;
        let mut prev: Option<Addr> = None;
        loop {
            let Some(addr) = slow else { break };
            let block = Block::at(addr);

            if block.is_alloc(heap) {
                return Err(CheckError::ListMemberNotFree { class, addr });
            }
            let size = block.size(heap);
            if class_of(size) != class {
                return Err(CheckError::ListMemberWrongClass { class, addr, size });
            }
            if block.prev_free(heap) != prev {
                return Err(CheckError::ListLinkInconsistent { class, addr });
            }

            seen.insert(addr);
            prev = Some(addr);
            slow = block.next_free(heap);

            fast = fast.and_then(|a| Block::at(a).next_free(heap));
            fast = fast.and_then(|a| Block::at(a).next_free(heap));
            if let (Some(s), Some(f)) = (slow, fast) {
                if s == f {
                    return Err(CheckError::ListCycle { class });
                }
            }
        }
    }

    Ok(seen)
}
