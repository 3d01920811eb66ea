//! A segregated free-list heap allocator atop a contiguous, grow-only byte
//! region.
//!
//! The region never shrinks and is owned by a single [`heap::Heap`]; the
//! [`allocator::Allocator`] on top of it manages thirteen size-class free
//! lists, splitting and coalescing blocks as described in the module docs
//! below. The allocator is intentionally single-threaded — see
//! [`allocator::Allocator`] for why it is `!Sync` by construction.
//!
//! Blocks are addressed as [`block::Addr`] byte-offsets into the region
//! rather than raw pointers, so the whole allocator is implementable (and
//! testable) without any `unsafe` pointer arithmetic outside of
//! [`heap::Heap`]'s one-time backing allocation.

#![warn(clippy::all)]
#![warn(clippy::perf)]
// This crate *is* the unsafe memory-management layer; deny-by-default
// unsafe_code doesn't fit a segregated allocator, same opt-out as the
// teacher's sandbox/plugin-sdk crates.
#![allow(unsafe_code)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod allocator;
pub mod block;
pub mod checker;
pub mod classes;
pub mod error;
pub mod freelist;
pub mod heap;

pub use allocator::Allocator;
pub use block::Addr;
pub use checker::CheckError;
pub use error::AllocError;
pub use heap::Heap;

/// Minimum block size in bytes: a 4-byte header, a 16-byte payload
/// (back-link + forward-link when free), and a 4-byte footer.
pub const MIN_BLOCK_SIZE: usize = 24;

/// Doubleword alignment in bytes, required of every block address and size.
pub const ALIGNMENT: usize = 8;

/// Default chunk size used to grow the heap when no free block fits and
/// the requested size doesn't force a larger extension.
pub const DEFAULT_HEAP_GROW: usize = 168;
