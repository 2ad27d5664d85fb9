//! Lookup diagnostics.
//!
//! Lookups take `&self`, so the counters live in `Cell`s here rather than
//! being mutated behind the caller's back elsewhere. The table reads them
//! through `snapshot` and checks `is_excessive` when it is dropped.

use core::cell::Cell;

/// Chain-walk steps per query above which the bin count is considered too
/// small for the load.
pub const MAX_COLLISIONS_PER_QUERY: u64 = 3;

/// Point-in-time copy of a table's lookup counters.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CollisionStats {
    /// Chain scans performed, one per lookup.
    pub queries: u64,
    /// Non-matching items stepped over during those scans.
    pub collisions: u64,
}

impl CollisionStats {
    /// True when collisions exceed three times the number of queries.
    pub fn is_excessive(&self) -> bool {
        self.collisions > MAX_COLLISIONS_PER_QUERY.saturating_mul(self.queries)
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    queries: Cell<u64>,
    collisions: Cell<u64>,
}

impl Counters {
    pub(crate) const fn new() -> Self {
        Self {
            queries: Cell::new(0),
            collisions: Cell::new(0),
        }
    }

    #[inline]
    pub(crate) fn query(&self) {
        self.queries.set(self.queries.get().wrapping_add(1));
    }

    #[inline]
    pub(crate) fn collision(&self) {
        self.collisions.set(self.collisions.get().wrapping_add(1));
    }

    pub(crate) fn snapshot(&self) -> CollisionStats {
        CollisionStats {
            queries: self.queries.get(),
            collisions: self.collisions.get(),
        }
    }
}
