//! A bounded-capacity LRU content cache keyed by `(host, uri)`, guarded by a
//! hand-rolled reader-preferring reader/writer lock.
//!
//! The cache is built for a single shared instance accessed from many
//! threads (one per proxy connection): `Cache::read`/`Cache::write` borrow
//! `&self`, not `&mut self`, and internally synchronize via
//! [`sync::ReaderPreferringLock`] rather than `std::sync::RwLock` — the
//! acquire/release protocol in spec (reader-count bookkeeping separate from
//! the writer gate, with the LRU promotion on a hit re-acquiring the writer
//! gate rather than upgrading a held read lock) doesn't fit an RAII guard
//! that must be released at the end of one lexical scope.

#![warn(clippy::all)]
#![warn(clippy::perf)]
#![allow(unsafe_code)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod lru;
pub mod slab;
pub mod sync;

pub use cache::Cache;
pub use error::CacheError;
