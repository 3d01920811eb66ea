//! Index-addressed cache block storage.
//!
//! Follows the same "arena + index pairs" redesign note as the allocator's
//! `Addr`/`Block` split: cache blocks live in a `Vec<Slot>` and are
//! addressed by [`BlockId`], never by reference, so the LRU list's
//! prev/next links are plain indices rather than an intrusive
//! pointer-linked list. Freed slots are threaded onto their own free list
//! and reused by the next insert, so repeated write/evict cycles don't grow
//! the slab without bound — the original's `cache.c` doesn't need this
//! because `free()` there returns memory straight to the process heap.

/// An index into a [`Slab`]. `u32` comfortably covers any cache this
/// workspace's default 1 MiB-scale capacity will ever hold entries for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BlockId(u32);

impl BlockId {
    fn from_usize(index: usize) -> Self {
        Self(u32::try_from(index).expect("cache slab index exceeds u32 addressing limit"))
    }

    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// A single cache block: a deep copy of its key and payload, plus the LRU
/// list links (spec §3 "Cache block").
pub struct Entry {
    pub host: String,
    pub uri: String,
    pub payload: Vec<u8>,
    pub prev: Option<BlockId>,
    pub next: Option<BlockId>,
}

enum Slot {
    Occupied(Entry),
    Free(Option<BlockId>),
}

/// Block storage with free-slot reuse.
pub struct Slab {
    slots: Vec<Slot>,
    free_head: Option<BlockId>,
}

impl Slab {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
        }
    }

    /// Stores `entry`, reusing a freed slot if one is available.
    pub fn insert(&mut self, entry: Entry) -> BlockId {
        if let Some(id) = self.free_head {
            let next_free = match &self.slots[id.as_usize()] {
                Slot::Free(next) => *next,
                Slot::Occupied(_) => unreachable!("free list pointed at an occupied slot"),
            };
            self.free_head = next_free;
            self.slots[id.as_usize()] = Slot::Occupied(entry);
            id
        } else {
            let id = BlockId::from_usize(self.slots.len());
            self.slots.push(Slot::Occupied(entry));
            id
        }
    }

    /// Removes and returns the entry at `id`, threading its slot onto the
    /// free list for reuse.
    pub fn remove(&mut self, id: BlockId) -> Entry {
        let old_free_head = self.free_head;
        match std::mem::replace(&mut self.slots[id.as_usize()], Slot::Free(old_free_head)) {
            Slot::Occupied(entry) => {
                self.free_head = Some(id);
                entry
            }
            Slot::Free(_) => panic!("double free of cache slot {id:?}"),
        }
    }

    #[must_use]
    pub fn get(&self, id: BlockId) -> &Entry {
        match &self.slots[id.as_usize()] {
            Slot::Occupied(entry) => entry,
            Slot::Free(_) => panic!("access to freed cache slot {id:?}"),
        }
    }

    pub fn get_mut(&mut self, id: BlockId) -> &mut Entry {
        match &mut self.slots[id.as_usize()] {
            Slot::Occupied(entry) => entry,
            Slot::Free(_) => panic!("access to freed cache slot {id:?}"),
        }
    }
}

impl Default for Slab {
    fn default() -> Self {
        Self::new()
    }
}
