//! `Cache`: `init`, `read`, `write`, driving [`crate::sync`] per the exact
//! reader/writer protocol in spec §5.

use crate::error::CacheError;
use crate::lru::Lru;
use crate::slab::{BlockId, Entry, Slab};
use crate::sync::{ReaderPreferringLock, SyncUnsafeCell};

struct State {
    slab: Slab,
    lru: Lru,
    remaining_space: usize,
}

/// A bounded-capacity LRU cache keyed by `(host, uri)` (spec §3 "Cache").
///
/// All methods take `&self`: concurrent callers share one `Cache` the way
/// the Proxy Frontend shares one cache handle across its worker threads.
/// Interior mutability is provided by [`sync::ReaderPreferringLock`], not a
/// generic lock type, so the reader/writer protocol is exactly spec's, down
/// to the LRU-promotion-as-a-separate-writer-acquire detail.
pub struct Cache {
    state: SyncUnsafeCell<State>,
    lock: ReaderPreferringLock,
    max_cache_size: usize,
    max_object_size: usize,
}

impl Cache {
    /// Allocates a cache with `max_cache_size` total bytes of payload
    /// capacity and a per-entry limit of `max_object_size` bytes (spec §4.2
    /// "init"). Unlike the original, there is no allocation-failure path to
    /// report here: Rust's global allocator aborts the process on OOM
    /// rather than returning an error a caller could act on.
    #[must_use]
    pub fn init(max_cache_size: usize, max_object_size: usize) -> Self {
        #[cfg(feature = "logging")]
        tracing::debug!(max_cache_size, max_object_size, "cache initialized");

        Self {
            state: SyncUnsafeCell::new(State {
                slab: Slab::new(),
                lru: Lru::new(),
                remaining_space: max_cache_size,
            }),
            lock: ReaderPreferringLock::new(),
            max_cache_size,
            max_object_size,
        }
    }

    #[must_use]
    pub fn max_object_size(&self) -> usize {
        self.max_object_size
    }

    #[must_use]
    pub fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    /// `remaining_space`, for the reconciliation invariant in spec §8 item 6.
    /// Takes the reader path since it only observes state.
    #[must_use]
    pub fn remaining_space(&self) -> usize {
        self.lock.begin_read();
        // SAFETY: the reader cohort collectively holds the writer gate for
        // the duration of this shared read (see `sync::ReaderPreferringLock`).
        let remaining = unsafe { (*self.state.get()).remaining_space };
        self.lock.end_read();
        remaining
    }

    /// Copies the payload keyed by `(host, uri)` into `buf` (clearing it
    /// first) and returns its length, or `None` on a miss (spec §4.2
    /// "read"). On a hit, promotes the entry to the MRU head under a
    /// separate writer acquisition, per spec §9's "do not attempt to
    /// upgrade a held read lock."
    pub fn read(&self, host: &str, uri: &str, buf: &mut Vec<u8>) -> Option<usize> {
        self.lock.begin_read();
        // SAFETY: see `remaining_space`.
        let state = unsafe { &*self.state.get() };
        let found = find(state, host, uri);
        let len = found.map(|id| {
            let entry = state.slab.get(id);
            buf.clear();
            buf.extend_from_slice(&entry.payload);
            entry.payload.len()
        });
        self.lock.end_read();

        if found.is_some() {
            self.lock.begin_write();
            // SAFETY: `begin_write` acquired the writer gate exclusively.
            let state = unsafe { &mut *self.state.get() };
            // A writer may have run between `end_read` and here and evicted
            // this exact entry (spec §5 allows writers between the read and
            // the promotion); re-find it under the writer gate instead of
            // trusting the `id` captured during the read phase.
            if let Some(id) = find(state, host, uri) {
                state.lru.move_to_front(&mut state.slab, id);
            }
            self.lock.end_write();

            #[cfg(feature = "logging")]
            tracing::debug!(host, uri, "cache hit");
        } else {
            #[cfg(feature = "logging")]
            tracing::debug!(host, uri, "cache miss");
        }

        len
    }

    /// Stores `payload` under `(host, uri)`, evicting LRU entries until
    /// there is room (spec §4.2 "write"). A prior entry under the same key
    /// is replaced in place (spec §9 Open Question 4: uniqueness enforced
    /// by search-and-replace, not the duplicate-tolerant original
    /// behavior).
    pub fn write(&self, host: &str, uri: &str, payload: &[u8]) -> Result<(), CacheError> {
        if payload.len() > self.max_object_size {
            return Err(CacheError::TooLarge {
                len: payload.len(),
                max: self.max_object_size,
            });
        }

        self.lock.begin_write();
        // SAFETY: `begin_write` acquired the writer gate exclusively.
        let state = unsafe { &mut *self.state.get() };

        if let Some(existing) = find(state, host, uri) {
            let removed = state.lru.remove(&mut state.slab, existing);
            state.remaining_space += removed.payload.len();
        }

        while state.remaining_space < payload.len() {
            let Some(victim) = state.lru.tail() else {
                self.lock.end_write();
                return Err(CacheError::AllocationFailed {
                    len: payload.len(),
                    max_cache_size: self.max_cache_size,
                });
            };
            let removed = state.lru.remove(&mut state.slab, victim);
            state.remaining_space += removed.payload.len();
        }

        let id = state.slab.insert(Entry {
            host: host.to_owned(),
            uri: uri.to_owned(),
            payload: payload.to_vec(),
            prev: None,
            next: None,
        });
        state.lru.push_front(&mut state.slab, id);
        state.remaining_space -= payload.len();

        self.lock.end_write();

        #[cfg(feature = "logging")]
        tracing::info!(host, uri, len = payload.len(), "cache stored");

        Ok(())
    }
}

/// Linear scan from the MRU head, bytewise key comparison (spec §4.2
/// "Search").
fn find(state: &State, host: &str, uri: &str) -> Option<BlockId> {
    let mut cursor = state.lru.head();
    while let Some(id) = cursor {
        let entry = state.slab.get(id);
        if entry.host == host && entry.uri == uri {
            return Some(id);
        }
        cursor = entry.next;
    }
    None
}

// Safety net: `State` is only ever reached through `SyncUnsafeCell`, which
// requires `State: Send`. It is: every field is an owned, non-`Rc` type.
const _: fn() = || {
    fn assert_send<T: Send>() {}
    assert_send::<State>();
};
