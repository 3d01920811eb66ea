//! Error type for the cache crate.

use thiserror::Error;

/// Failure reasons from [`crate::Cache::write`]. `read` has no error type —
/// a miss is simply `None` (spec §9: "map null/-1 returns to a
/// result-or-error sum type" — a cache miss isn't an error, so `Option` is
/// the correct sum type here, not `Result`).
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `payload.len() > max_object_size`.
    #[error("payload of {len} bytes exceeds the {max} byte object size limit")]
    TooLarge { len: usize, max: usize },

    /// Evicting every entry still wasn't enough to make room for `len`
    /// bytes (the write itself is larger than the cache's total capacity).
    #[error("cannot free {len} bytes of cache space (capacity is {max_cache_size} bytes)")]
    AllocationFailed { len: usize, max_cache_size: usize },
}
