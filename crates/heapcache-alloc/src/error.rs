//! Error types for the allocator crate.
//!
//! Most public operations return `Option` rather than `Result` — a failed
//! `alloc`/`realloc`/`calloc` is communicated as `None`, matching the
//! original's null-return convention (spec §4.1 "Failure semantics"). This
//! enum exists for [`crate::Heap::new`] and [`crate::checker`], where a
//! caller benefits from knowing *why*, not just *that*, something failed.

use thiserror::Error;

/// Errors raised outside the hot `alloc`/`free`/`realloc` path.
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// The requested heap capacity doesn't fit the `u32` offset space this
    /// allocator uses to address blocks (see `SPEC_FULL.md` §3).
    #[error("requested heap capacity {requested} exceeds the {max} byte addressing limit")]
    CapacityTooLarge { requested: usize, max: usize },

    /// The backing allocation for the heap's byte region itself failed.
    #[error("failed to reserve {size} bytes for the heap region")]
    ReservationFailed { size: usize },

    /// `alloc`/`calloc` was asked for a zero-sized or otherwise invalid size.
    #[error("invalid allocation size: {reason}")]
    InvalidArgument { reason: &'static str },
}
