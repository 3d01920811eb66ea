//! The LRU list: a doubly linked list over [`BlockId`]s rather than raw
//! pointers (spec §3 "the list is acyclic; the block with null
//! forward-link is the least-recently-used; `root` is the most recently
//! used").

use crate::slab::{BlockId, Entry, Slab};

/// Head (`root`, most-recently-used) and tail (least-recently-used) of the
/// cache's block list.
pub struct Lru {
    head: Option<BlockId>,
    tail: Option<BlockId>,
}

impl Lru {
    #[must_use]
    pub fn new() -> Self {
        Self {
            head: None,
            tail: None,
        }
    }

    #[must_use]
    pub fn head(&self) -> Option<BlockId> {
        self.head
    }

    #[must_use]
    pub fn tail(&self) -> Option<BlockId> {
        self.tail
    }

    /// Inserts `id` at the MRU head (spec §4.2 "inserts at the MRU head").
    pub fn push_front(&mut self, slab: &mut Slab, id: BlockId) {
        let old_head = self.head;
        slab.get_mut(id).prev = None;
        slab.get_mut(id).next = old_head;
        if let Some(head_id) = old_head {
            slab.get_mut(head_id).prev = Some(id);
        }
        self.head = Some(id);
        if self.tail.is_none() {
            self.tail = Some(id);
        }
    }

    /// Bridges `id`'s neighbors, removing it from the list without
    /// touching its storage in the slab.
    fn unlink(&mut self, slab: &mut Slab, id: BlockId) {
        let (prev, next) = {
            let entry = slab.get(id);
            (entry.prev, entry.next)
        };
        match prev {
            Some(prev_id) => slab.get_mut(prev_id).next = next,
            None => self.head = next,
        }
        match next {
            Some(next_id) => slab.get_mut(next_id).prev = prev,
            None => self.tail = prev,
        }
    }

    /// Unlinks `id` and reinserts it at the head (spec §4.2 "LRU update on
    /// hit": unlink the block and reinsert at root).
    pub fn move_to_front(&mut self, slab: &mut Slab, id: BlockId) {
        if self.head == Some(id) {
            return;
        }
        self.unlink(slab, id);
        self.push_front(slab, id);
    }

    /// Unlinks `id` and removes its storage, returning the freed entry so
    /// callers can reclaim its payload size (spec §4.2 "Eviction").
    pub fn remove(&mut self, slab: &mut Slab, id: BlockId) -> Entry {
        self.unlink(slab, id);
        slab.remove(id)
    }
}

impl Default for Lru {
    fn default() -> Self {
        Self::new()
    }
}
