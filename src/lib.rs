//! parent-hashmap: a single-threaded table of entities identified by an
//! unordered set of parent ids, such as mesh edges keyed by their two
//! vertices or faces keyed by their corner vertices.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: hand out one stable item, with one small integer id, per
//!   unordered parent set, and find it again from any permutation of the
//!   parents or from its id.
//! - Layers:
//!   - `keys`: canonicalization. `[a, b]` sorts into `Key2`; `[a, b, c, d]`
//!     sorts and keeps the three smallest as `Key3`. Both hash with fixed
//!     multipliers.
//!   - `ids`: `IdAllocator` seam plus `RecyclingIds`, which reuses
//!     released ids before minting new ones.
//!   - `ParentHashMap<K, V, A>`: fixed power-of-two bin array, each bin the
//!     head of a singly linked chain; an id -> item index; a lazily
//!     maintained list of used bins for sparse iteration.
//!
//! Constraints
//! - Single-threaded: lookup counters are `Cell`s, so the table is `!Sync`.
//! - Fixed bin count chosen at construction. There is no rehashing; a
//!   warning is logged on drop when chains were too long for the load.
//! - O(1) chain insertion at the head; O(chain) lookup and removal.
//!
//! Storage
//! - Items live in a `slotmap::SlotMap`. Chain links are arena keys, not
//!   pointers, so unlinking cannot dangle and a `Handle` to a removed item
//!   never resolves, even after its slot or id is reused.
//! - Each table takes a stamp from a global counter at construction and
//!   writes it into every handle it issues. A handle never resolves in a
//!   table other than its own.
//! - The table owns every item. Dropping it drops each remaining item once.
//!
//! Used-bin tracking
//! - A bin is appended to `used_bins` the first time an item lands in it.
//!   Removals never prune the list; iteration skips bins that have since
//!   emptied. This keeps iteration proportional to bins ever touched
//!   rather than to the bin count, and keeps removal O(chain).
//!
//! Four-parent keys
//! - Only the three smallest of four parents are stored and compared. Two
//!   parent sets that share their three smallest values name the same
//!   item. For quadrilateral mesh faces, three corners already identify
//!   the face.
//!
//! Errors
//! - A bin count that is not a power of two, an unknown id, and a stale
//!   handle are reported as `Error`. A live item missing from its own
//!   bin's chain is a broken internal invariant and panics, as does an
//!   `IdAllocator` that hands out an id that is still live.
//!
//! Example
//! ```
//! use parent_hashmap::{PairHashMap, QuadHashMap};
//!
//! let mut edges: PairHashMap<()> = PairHashMap::with_bins(16).unwrap();
//! let e = edges.get([1, 2]);
//! assert_eq!(edges.get([2, 1]), e);
//!
//! let mut faces: QuadHashMap<()> = QuadHashMap::with_bins(16).unwrap();
//! let f = faces.get([10, 20, 30, 40]);
//! assert_eq!(faces.peek([40, 30, 20, 10]), Some(f));
//! assert_eq!(f.key(&faces).unwrap().as_array(), [10, 20, 30]);
//! ```

mod error;
pub mod ids;
pub mod keys;
pub mod parent_hash_map;
mod parent_hash_map_proptest;
pub mod stats;

/// Item ids, also the type of parent ids.
pub type Id = u32;

// Public surface
pub use error::Error;
pub use ids::{IdAllocator, RecyclingIds};
pub use keys::{CanonicalKey, Key2, Key3, Parents};
pub use parent_hash_map::{Handle, Iter, IterMut, ParentHashMap, DEFAULT_BIN_COUNT};
pub use stats::CollisionStats;

/// Table of items keyed by two parents.
pub type PairHashMap<V, A = RecyclingIds> = ParentHashMap<Key2, V, A>;

/// Table of items keyed by four parents, of which the three smallest are
/// kept.
pub type QuadHashMap<V, A = RecyclingIds> = ParentHashMap<Key3, V, A>;
