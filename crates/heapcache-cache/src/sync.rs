//! Synchronization primitives for the cache (spec §5).
//!
//! `ReaderPreferringLock` is deliberately not built from `std::sync::RwLock`:
//! spec's protocol needs an acquire in one call (`begin_read`) and its
//! matching release in another (`end_read`), with the LRU-promotion step in
//! between done under a *separate* writer acquisition rather than by
//! upgrading the read lock — a shape an RAII guard can't express, since the
//! guard would have to outlive the function call that produced it. Instead
//! this mirrors spec's own primitives directly: a `reader_count_gate`
//! (a plain `Mutex<usize>`) and a `writer_gate` (a hand-rolled binary
//! semaphore over `Mutex<bool>` + `Condvar`).

use std::cell::UnsafeCell;
use std::sync::{Condvar, Mutex};

/// A binary semaphore: `acquire` blocks while unavailable, `release` makes
/// it available and wakes one waiter.
pub(crate) struct Semaphore {
    available: Mutex<bool>,
    condvar: Condvar,
}

impl Semaphore {
    fn new() -> Self {
        Self {
            available: Mutex::new(true),
            condvar: Condvar::new(),
        }
    }

    pub(crate) fn acquire(&self) {
        let mut available = self.available.lock().unwrap_or_else(|e| e.into_inner());
        while !*available {
            available = self
                .condvar
                .wait(available)
                .unwrap_or_else(|e| e.into_inner());
        }
        *available = false;
    }

    pub(crate) fn release(&self) {
        let mut available = self.available.lock().unwrap_or_else(|e| e.into_inner());
        *available = true;
        self.condvar.notify_one();
    }
}

/// The reader-preferring discipline from spec §5: readers serialize only on
/// `reader_count`, and only the first reader to arrive (and the last to
/// leave) touches `writer_gate`; a writer always acquires `writer_gate`
/// directly.
pub(crate) struct ReaderPreferringLock {
    reader_count: Mutex<usize>,
    writer_gate: Semaphore,
}

impl ReaderPreferringLock {
    pub(crate) fn new() -> Self {
        Self {
            reader_count: Mutex::new(0),
            writer_gate: Semaphore::new(),
        }
    }

    /// Acquire `reader_count_gate`, increment, and — on the 0→1 transition
    /// — acquire `writer_gate` on behalf of the whole reader cohort.
    pub(crate) fn begin_read(&self) {
        let mut count = self.reader_count.lock().unwrap_or_else(|e| e.into_inner());
        *count += 1;
        if *count == 1 {
            self.writer_gate.acquire();
        }
    }

    /// Re-acquire `reader_count_gate`, decrement, and — on the 1→0
    /// transition — release `writer_gate`.
    pub(crate) fn end_read(&self) {
        let mut count = self.reader_count.lock().unwrap_or_else(|e| e.into_inner());
        *count -= 1;
        if *count == 0 {
            self.writer_gate.release();
        }
    }

    pub(crate) fn begin_write(&self) {
        self.writer_gate.acquire();
    }

    pub(crate) fn end_write(&self) {
        self.writer_gate.release();
    }
}

/// An `UnsafeCell` wrapper that implements `Sync`, for state whose actual
/// synchronization is [`ReaderPreferringLock`] rather than anything the
/// compiler can see. Mirrors the allocator workspace's own
/// `SyncUnsafeCell` (`crates/memory/src/core/sync_cell.rs`).
#[repr(transparent)]
pub(crate) struct SyncUnsafeCell<T>(UnsafeCell<T>);

// SAFETY: every access to the wrapped value goes through a
// `ReaderPreferringLock` that guarantees either shared read access (one or
// more concurrent readers, no writer) or exclusive write access (one writer,
// no readers), so `T: Send` is the only bound `Sync` needs here.
unsafe impl<T: Send> Sync for SyncUnsafeCell<T> {}

impl<T> SyncUnsafeCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self(UnsafeCell::new(value))
    }

    pub(crate) fn get(&self) -> *mut T {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn semaphore_mutual_exclusion() {
        let sem = Arc::new(Semaphore::new());
        let counter = Arc::new(Mutex::new(0usize));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let sem = Arc::clone(&sem);
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                sem.acquire();
                let mut c = counter.lock().unwrap();
                *c += 1;
                sem.release();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*counter.lock().unwrap(), 8);
    }

    #[test]
    fn reader_count_gates_writer_once() {
        let lock = ReaderPreferringLock::new();
        lock.begin_read();
        lock.begin_read();
        lock.end_read();
        lock.end_read();
        // Writer gate must be available again after the last reader leaves.
        lock.begin_write();
        lock.end_write();
    }
}
