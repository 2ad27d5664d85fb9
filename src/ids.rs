//! Item id allocation.
//!
//! The table asks its allocator for an id whenever it creates an item and
//! hands the id back exactly once when that item is removed.

use crate::Id;

/// A source of item ids.
pub trait IdAllocator {
    /// Return an id not held by any live item of the owning table.
    fn allocate(&mut self) -> Id;

    /// Return a previously allocated id to the pool.
    fn release(&mut self, id: Id);
}

/// Counter-plus-free-list allocator. Released ids are handed out again
/// before fresh ones, most recently released first.
#[derive(Clone, Debug, Default)]
pub struct RecyclingIds {
    next: Id,
    reusable: Vec<Id>,
}

impl RecyclingIds {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Fresh ids start at `first_id`.
    pub fn starting_at(first_id: Id) -> Self {
        Self {
            next: first_id,
            reusable: Vec::new(),
        }
    }

    /// Number of released ids waiting for reuse.
    pub fn reusable_len(&self) -> usize {
        self.reusable.len()
    }
}

impl IdAllocator for RecyclingIds {
    #[inline]
    fn allocate(&mut self) -> Id {
        if let Some(id) = self.reusable.pop() {
            return id;
        }
        let id = self.next;
        self.next = match id.checked_add(1) {
            Some(n) => n,
            None => panic!("RecyclingIds: id space exhausted"),
        };
        id
    }

    #[inline]
    fn release(&mut self, id: Id) {
        debug_assert!(id < self.next, "released id {id} was never allocated");
        self.reusable.push(id);
    }
}
