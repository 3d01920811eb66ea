//! The segregated free-list allocator itself: `init`, `alloc`, `free`,
//! `realloc`, `calloc`, and the `find_fit`/`place`/`coalesce`/`extend_heap`
//! algorithms behind them (spec §4.1).

use crate::block::{Addr, Block};
use crate::classes::{class_of, NUM_CLASSES};
use crate::error::AllocError;
use crate::freelist::FreeListDirectory;
use crate::heap::Heap;
use crate::{ALIGNMENT, DEFAULT_HEAP_GROW, MIN_BLOCK_SIZE};

/// Default heap capacity for [`Allocator::init`]: generous enough for the
/// scenarios in spec §8 without callers having to think about sizing.
pub const DEFAULT_CAPACITY: usize = 64 * 1024 * 1024;

/// A free-list heap allocator atop a single [`Heap`].
///
/// Holds a [`Heap`] (whose grow-only cursor is a bare `Cell`, not an
/// atomic) as a field, which makes `Allocator` itself `!Sync` — the
/// compiler, not a comment, enforces spec §5's "concurrent calls are a
/// contract violation."
pub struct Allocator {
    pub(crate) heap: Heap,
    pub(crate) free_lists: FreeListDirectory,
    pub(crate) prologue: Addr,
    pub(crate) epilogue: Addr,
}

fn adjusted_size(requested: usize) -> usize {
    let with_header = requested.saturating_add(8);
    let rounded = with_header.div_ceil(ALIGNMENT) * ALIGNMENT;
    rounded.max(MIN_BLOCK_SIZE)
}

fn round_extend_size(requested: usize) -> usize {
    let rounded = requested.div_ceil(ALIGNMENT) * ALIGNMENT;
    rounded.max(MIN_BLOCK_SIZE)
}

impl Allocator {
    /// Initializes an allocator with [`DEFAULT_CAPACITY`] bytes of address
    /// space reserved up front.
    pub fn init() -> Result<Self, AllocError> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Initializes an allocator whose heap can never grow past `capacity`
    /// bytes (spec §4.1 "init").
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        let heap = Heap::new(capacity)?;

        // Alignment padding: a single unused word ahead of the prologue.
        // Without it the prologue header starts at offset 0, so every
        // block header lands on an 8-byte boundary and, since
        // `payload_addr` is `header + 4`, every payload address would be
        // 4 mod 8 instead of doubleword-aligned (spec §3/§8 item 4).
        // Shifting the prologue header to offset 4 puts every header at
        // 4 mod 8 and every payload at 0 mod 8.
        heap.grow(4)
            .ok_or(AllocError::ReservationFailed { size: 4 })?;

        // Prologue: a permanently-allocated (size=8, alloc=1) sentinel so
        // the first real block's backward coalesce check never needs a
        // bounds special-case (spec §3 "Prologue block").
        let prologue = heap
            .grow(8)
            .ok_or(AllocError::ReservationFailed { size: 8 })?;
        Block::at(prologue).set(&heap, 8, true);

        // Epilogue: a permanently-allocated (size=0, alloc=1) sentinel
        // that stops the forward heap walk (spec §3 "User region").
        let epilogue = heap
            .grow(4)
            .ok_or(AllocError::ReservationFailed { size: 4 })?;
        Block::at(epilogue).set(&heap, 0, true);

        let mut allocator = Self {
            heap,
            free_lists: FreeListDirectory::new(),
            prologue,
            epilogue,
        };

        #[cfg(feature = "logging")]
        tracing::debug!(capacity, "heap allocator initialized");

        allocator
            .extend_heap(DEFAULT_HEAP_GROW)
            .ok_or(AllocError::ReservationFailed {
                size: DEFAULT_HEAP_GROW,
            })?;
        Ok(allocator)
    }

    /// Current `[lo, hi)` bounds of the underlying heap, for the checker.
    #[must_use]
    pub fn bounds(&self) -> (Addr, Addr) {
        self.heap.bounds()
    }

    /// Validates every heap and free-list invariant (spec §4.1 "Checker"),
    /// intended for use in tests rather than on the hot allocation path.
    pub fn check(&self) -> Result<(), crate::checker::CheckError> {
        crate::checker::check(self)
    }

    /// Borrows `len` bytes of the payload at `ptr` for reading. `ptr` must
    /// be a live allocation and `len` must not exceed its usable capacity.
    #[must_use]
    pub fn payload(&self, ptr: Addr, len: usize) -> &[u8] {
        self.heap.slice(ptr, len)
    }

    /// Borrows `len` bytes of the payload at `ptr` for writing. Same
    /// contract as [`Self::payload`].
    pub fn payload_mut(&mut self, ptr: Addr, len: usize) -> &mut [u8] {
        self.heap.slice_mut(ptr, len)
    }

    /// Allocates `size` bytes, returning the payload address or `None` on
    /// zero-size request or heap exhaustion (spec §4.1 "alloc").
    pub fn alloc(&mut self, size: usize) -> Option<Addr> {
        if size == 0 {
            return None;
        }
        let a = adjusted_size(size);

        if let Some(fit) = self.find_fit(a) {
            self.place(fit, a);
            return Some(Block::at(fit).payload_addr());
        }

        let grown = self.extend_heap(a.max(DEFAULT_HEAP_GROW))?;
        self.place(grown, a);
        Some(Block::at(grown).payload_addr())
    }

    /// Frees the block whose payload starts at `ptr`. A no-op if `ptr` is
    /// `None` (spec §4.1 "free").
    pub fn free(&mut self, ptr: Option<Addr>) {
        let Some(ptr) = ptr else { return };
        let addr = ptr.sub(4);
        let size = Block::at(addr).size(&self.heap);
        Block::at(addr).set(&self.heap, size, false);
        self.coalesce(addr);
    }

    /// Resizes the allocation at `ptr` to `size` bytes (spec §4.1
    /// "realloc"). `ptr == None` behaves like `alloc`; `size == 0` behaves
    /// like `free` and returns `None`.
    pub fn realloc(&mut self, ptr: Option<Addr>, size: usize) -> Option<Addr> {
        let Some(ptr) = ptr else {
            return self.alloc(size);
        };
        if size == 0 {
            self.free(Some(ptr));
            return None;
        }

        let addr = ptr.sub(4);
        let n = adjusted_size(size);
        let o = Block::at(addr).size(&self.heap);

        if n == o {
            return Some(ptr);
        }

        if n < o {
            if o - n >= MIN_BLOCK_SIZE {
                Block::at(addr).set(&self.heap, n, true);
                let remainder_addr = addr.add(n);
                Block::at(remainder_addr).set(&self.heap, o - n, false);
                self.coalesce(remainder_addr);
            }
            return Some(ptr);
        }

        // n > o: try to grow in place by absorbing a free next block.
        let k = n - o;
        let next_addr = Block::at(addr).next_block_addr(&self.heap);
        let next_block = Block::at(next_addr);
        let next_is_free = !next_block.is_alloc(&self.heap);
        let next_size = next_block.size(&self.heap);

        // Strict `>`, matching the original (`original_source/Malloc/mm.c`)
        // and spec §9 Open Question 1: accept either interpretation, tests
        // must not depend on the strict form.
        if next_is_free && next_size > k {
            self.free_lists
                .remove(&self.heap, class_of(next_size), next_addr);
            let remainder = next_size - k;
            if remainder >= MIN_BLOCK_SIZE {
                Block::at(addr).set(&self.heap, n, true);
                let remainder_addr = addr.add(n);
                Block::at(remainder_addr).set(&self.heap, remainder, false);
                self.coalesce(remainder_addr);
            } else {
                Block::at(addr).set(&self.heap, o + next_size, true);
            }
            return Some(ptr);
        }

        // Fallback: fresh allocation, copy the old usable payload, free
        // the old block. Old block is left untouched if the fresh
        // allocation fails.
        let fresh = self.alloc(size)?;
        self.heap.copy_within(ptr, fresh, o - 8);
        self.free(Some(ptr));
        Some(fresh)
    }

    /// Allocates space for `nmemb` elements of `size` bytes each, zeroed
    /// (spec §4.1 "calloc"). Unlike the original, the `nmemb * size`
    /// product is overflow-checked (spec §9 Open Question 2) and there is
    /// no null pointer to forget to check before zeroing (Open Question 3
    /// — moot under an `Option`-returning API).
    pub fn calloc(&mut self, nmemb: usize, size: usize) -> Option<Addr> {
        let total = nmemb.checked_mul(size)?;
        let addr = self.alloc(total)?;
        self.heap.zero(addr, total);
        Some(addr)
    }

    /// Finds the first free block of size `>= a`, scanning `a`'s class and
    /// then progressively larger classes (spec §4.1 "Find-fit").
    fn find_fit(&self, a: usize) -> Option<Addr> {
        for class in class_of(a)..NUM_CLASSES {
            let mut cursor = self.free_lists.head(class);
            while let Some(addr) = cursor {
                let block = Block::at(addr);
                if block.size(&self.heap) >= a {
                    return Some(addr);
                }
                cursor = block.next_free(&self.heap);
            }
        }
        None
    }

    /// Removes a free block from its list and marks (a prefix of) it
    /// allocated, splitting off a free remainder when the leftover is
    /// large enough to be its own block (spec §4.1 "Place").
    fn place(&mut self, addr: Addr, a: usize) {
        let block = Block::at(addr);
        let size = block.size(&self.heap);
        self.free_lists.remove(&self.heap, class_of(size), addr);

        if size - a >= MIN_BLOCK_SIZE {
            block.set(&self.heap, a, true);
            let remainder_addr = addr.add(a);
            Block::at(remainder_addr).set(&self.heap, size - a, false);
            self.coalesce(remainder_addr);
        } else {
            block.set(&self.heap, size, true);
        }
    }

    /// Merges a just-marked-free block at `addr` with any free physical
    /// neighbors and inserts the result into its class list (spec §4.1
    /// "Coalesce"). Returns the address of the (possibly merged) block.
    fn coalesce(&mut self, addr: Addr) -> Addr {
        let size = Block::at(addr).size(&self.heap);

        let prev_addr = Block::at(addr).prev_block_addr(&self.heap);
        let prev_block = Block::at(prev_addr);
        let prev_alloc = prev_block.is_alloc(&self.heap);
        let prev_size = prev_block.size(&self.heap);

        let next_addr = Block::at(addr).next_block_addr(&self.heap);
        let next_block = Block::at(next_addr);
        let next_alloc = next_block.is_alloc(&self.heap);
        let next_size = next_block.size(&self.heap);

        match (prev_alloc, next_alloc) {
            (true, true) => {
                self.free_lists.insert(&self.heap, class_of(size), addr);
                addr
            }
            (true, false) => {
                self.free_lists
                    .remove(&self.heap, class_of(next_size), next_addr);
                let merged = size + next_size;
                Block::at(addr).set(&self.heap, merged, false);
                self.free_lists.insert(&self.heap, class_of(merged), addr);
                addr
            }
            (false, true) => {
                self.free_lists
                    .remove(&self.heap, class_of(prev_size), prev_addr);
                let merged = prev_size + size;
                Block::at(prev_addr).set(&self.heap, merged, false);
                self.free_lists
                    .insert(&self.heap, class_of(merged), prev_addr);
                prev_addr
            }
            (false, false) => {
                self.free_lists
                    .remove(&self.heap, class_of(prev_size), prev_addr);
                self.free_lists
                    .remove(&self.heap, class_of(next_size), next_addr);
                let merged = prev_size + size + next_size;
                Block::at(prev_addr).set(&self.heap, merged, false);
                self.free_lists
                    .insert(&self.heap, class_of(merged), prev_addr);
                prev_addr
            }
        }
    }

    /// Extends the heap by (at least) `size` bytes, writing the new free
    /// block's header/footer, a fresh epilogue, and coalescing the new
    /// block with whatever free block used to sit just before the old
    /// epilogue (spec §4.1 "Heap extension").
    fn extend_heap(&mut self, size: usize) -> Option<Addr> {
        let size = round_extend_size(size);
        let old_epilogue = self.epilogue;

        self.heap.grow(size)?;
        Block::at(old_epilogue).set(&self.heap, size, false);

        let new_epilogue = old_epilogue.add(size);
        Block::at(new_epilogue).set(&self.heap, 0, true);
        self.epilogue = new_epilogue;

        Some(self.coalesce(old_epilogue))
    }
}
