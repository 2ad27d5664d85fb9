//! ParentHashMap: fixed-size chained hash table keyed by canonical parent
//! sets, with a second index from item id to item.

use crate::error::Error;
use crate::ids::{IdAllocator, RecyclingIds};
use crate::keys::{CanonicalKey, Parents};
use crate::stats::{CollisionStats, Counters};
use crate::Id;
use core::sync::atomic::{AtomicU32, Ordering};
use slotmap::{DefaultKey, SlotMap};

/// Bin count used by `ParentHashMap::new`.
pub const DEFAULT_BIN_COUNT: usize = 128 * 1024;

static NEXT_TABLE: AtomicU32 = AtomicU32::new(0);

/// Non-owning reference to an item. Goes stale when the item is removed;
/// a stale handle never resolves, even if its arena slot is reused.
///
/// Handles are stamped with their table and do not resolve in any other
/// table. Their ids may still be used as parents elsewhere.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle {
    slot: DefaultKey,
    id: Id,
    table: u32,
}

impl Handle {
    /// The item's id. Stays readable after the item is gone.
    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn key<'a, K, V, A>(&self, map: &'a ParentHashMap<K, V, A>) -> Option<&'a K>
    where
        K: CanonicalKey,
        A: IdAllocator,
    {
        map.key(*self)
    }

    pub fn value<'a, K, V, A>(&self, map: &'a ParentHashMap<K, V, A>) -> Option<&'a V>
    where
        K: CanonicalKey,
        A: IdAllocator,
    {
        map.value(*self)
    }

    pub fn value_mut<'a, K, V, A>(&self, map: &'a mut ParentHashMap<K, V, A>) -> Option<&'a mut V>
    where
        K: CanonicalKey,
        A: IdAllocator,
    {
        map.value_mut(*self)
    }
}

#[derive(Debug)]
struct Node<K, V> {
    id: Id,
    key: K,
    value: V,
    // next item in the same bin
    next: Option<DefaultKey>,
}

pub struct ParentHashMap<K, V, A = RecyclingIds> {
    bins: Box<[Option<DefaultKey>]>,
    mask: usize,
    // Bins that have held an item at some point. Never pruned, so entries
    // may point at bins emptied by removals.
    used_bins: Vec<usize>,
    bin_registered: Box<[bool]>,
    slots: SlotMap<DefaultKey, Node<K, V>>,
    id_to_item: Vec<Option<DefaultKey>>,
    allocator: A,
    counters: Counters,
    stamp: u32,
}

impl<K, V> ParentHashMap<K, V>
where
    K: CanonicalKey,
{
    /// Table with `DEFAULT_BIN_COUNT` bins and a recycling id allocator.
    pub fn new() -> Self {
        Self::build(DEFAULT_BIN_COUNT, RecyclingIds::new())
    }

    /// Table with `bins` bins, which must be a power of two.
    pub fn with_bins(bins: usize) -> Result<Self, Error> {
        Self::with_bins_and_allocator(bins, RecyclingIds::new())
    }
}

impl<K, V> Default for ParentHashMap<K, V>
where
    K: CanonicalKey,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over items, bin by bin in the order bins were first used,
/// then along each bin's chain.
pub struct Iter<'a, K, V, A> {
    map: &'a ParentHashMap<K, V, A>,
    next_bin: usize,
    cur: Option<DefaultKey>,
}

impl<'a, K, V, A> Iter<'a, K, V, A> {
    fn new(map: &'a ParentHashMap<K, V, A>) -> Self {
        let mut it = Iter {
            map,
            next_bin: 0,
            cur: None,
        };
        it.cur = it.next_chain();
        it
    }

    // Head of the next non-empty registered bin, skipping stale entries.
    fn next_chain(&mut self) -> Option<DefaultKey> {
        while let Some(&bin) = self.map.used_bins.get(self.next_bin) {
            self.next_bin += 1;
            if let Some(head) = self.map.bins[bin] {
                return Some(head);
            }
        }
        None
    }
}

impl<'a, K, V, A> Iterator for Iter<'a, K, V, A> {
    type Item = (Handle, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cur?;
        let map = self.map;
        let node = &map.slots[slot];
        self.cur = match node.next {
            Some(next) => Some(next),
            None => self.next_chain(),
        };
        let h = Handle {
            slot,
            id: node.id,
            table: map.stamp,
        };
        Some((h, &node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.cur.is_none() {
            (0, Some(0))
        } else {
            (1, Some(self.map.slots.len()))
        }
    }
}

impl<K, V, A> core::iter::FusedIterator for Iter<'_, K, V, A> {}

/// Iterator over items with mutable values, in arena order.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Node<K, V>>,
    stamp: u32,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Handle, &'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let table = self.stamp;
        self.it.next().map(|(slot, n)| {
            let h = Handle {
                slot,
                id: n.id,
                table,
            };
            (h, &n.key, &mut n.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V, A> ParentHashMap<K, V, A>
where
    K: CanonicalKey,
    A: IdAllocator,
{
    /// Table with `bins` bins and a caller-provided id allocator.
    pub fn with_bins_and_allocator(bins: usize, allocator: A) -> Result<Self, Error> {
        if !bins.is_power_of_two() {
            return Err(Error::BinCountNotPowerOfTwo(bins));
        }
        Ok(Self::build(bins, allocator))
    }

    fn build(bins: usize, allocator: A) -> Self {
        debug_assert!(bins.is_power_of_two());
        Self {
            bins: vec![None; bins].into_boxed_slice(),
            mask: bins - 1,
            used_bins: Vec::new(),
            bin_registered: vec![false; bins].into_boxed_slice(),
            slots: SlotMap::with_key(),
            id_to_item: Vec::new(),
            allocator,
            counters: Counters::new(),
            stamp: NEXT_TABLE.fetch_add(1, Ordering::Relaxed),
        }
    }

    #[inline]
    fn handle(&self, slot: DefaultKey, id: Id) -> Handle {
        Handle {
            slot,
            id,
            table: self.stamp,
        }
    }

    #[inline]
    fn bin_of(&self, key: &K) -> usize {
        key.bin_hash() as usize & self.mask
    }

    fn search(&self, bin: usize, key: &K) -> Option<DefaultKey> {
        self.counters.query();
        let mut cur = self.bins[bin];
        while let Some(slot) = cur {
            let node = &self.slots[slot];
            if node.key == *key {
                return Some(slot);
            }
            self.counters.collision();
            cur = node.next;
        }
        None
    }

    fn node(&self, h: Handle) -> Option<&Node<K, V>> {
        if h.table != self.stamp {
            return None;
        }
        self.slots.get(h.slot).filter(|n| n.id == h.id)
    }

    fn node_mut(&mut self, h: Handle) -> Option<&mut Node<K, V>> {
        if h.table != self.stamp {
            return None;
        }
        self.slots.get_mut(h.slot).filter(|n| n.id == h.id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Number of bins registered for iteration, including ones emptied
    /// since by removals.
    pub fn registered_bins(&self) -> usize {
        self.used_bins.len()
    }

    pub fn stats(&self) -> CollisionStats {
        self.counters.snapshot()
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Return the item for `parents`, creating it with a default value if
    /// it does not exist yet.
    pub fn get<P>(&mut self, parents: P) -> Handle
    where
        P: Parents<Key = K>,
        V: Default,
    {
        self.get_or_insert_with(parents, |_| V::default())
    }

    /// Like `get`, but builds a missing item's value from its new id.
    /// `make` is not called when the item already exists.
    pub fn get_or_insert_with<P, F>(&mut self, parents: P, make: F) -> Handle
    where
        P: Parents<Key = K>,
        F: FnOnce(Id) -> V,
    {
        let key = parents.canonicalize();
        let bin = self.bin_of(&key);
        if let Some(slot) = self.search(bin, &key) {
            return self.handle(slot, self.slots[slot].id);
        }

        let id = self.allocator.allocate();
        let idx = id as usize;
        if self.id_to_item.len() <= idx {
            self.id_to_item.resize(idx + 1, None);
        }
        // Checked before anything is linked so the table stays consistent.
        assert!(
            self.id_to_item[idx].is_none(),
            "IdAllocator returned id {id}, which is still live"
        );
        let value = make(id);
        let slot = self.slots.insert(Node {
            id,
            key,
            value,
            next: self.bins[bin],
        });
        self.bins[bin] = Some(slot);

        if !self.bin_registered[bin] {
            self.bin_registered[bin] = true;
            self.used_bins.push(bin);
        }

        self.id_to_item[idx] = Some(slot);

        self.handle(slot, id)
    }

    /// Return the item for `parents` if it exists. Never allocates.
    pub fn peek<P>(&self, parents: P) -> Option<Handle>
    where
        P: Parents<Key = K>,
    {
        let key = parents.canonicalize();
        let slot = self.search(self.bin_of(&key), &key)?;
        Some(self.handle(slot, self.slots[slot].id))
    }

    pub fn contains<P>(&self, parents: P) -> bool
    where
        P: Parents<Key = K>,
    {
        self.peek(parents).is_some()
    }

    /// Return the live item with this id. `None` for ids never issued by
    /// this table and for ids of removed items.
    pub fn peek_id(&self, id: Id) -> Option<Handle> {
        let slot = (*self.id_to_item.get(id as usize)?)?;
        Some(self.handle(slot, id))
    }

    pub fn key(&self, h: Handle) -> Option<&K> {
        self.node(h).map(|n| &n.key)
    }

    pub fn value(&self, h: Handle) -> Option<&V> {
        self.node(h).map(|n| &n.value)
    }

    pub fn value_mut(&mut self, h: Handle) -> Option<&mut V> {
        self.node_mut(h).map(|n| &mut n.value)
    }

    /// Remove an item, release its id, and return its key and value.
    ///
    /// Panics if the item is live but missing from the chain of the bin
    /// its key hashes to.
    pub fn remove(&mut self, h: Handle) -> Result<(K, V), Error> {
        if self.node(h).is_none() {
            return Err(Error::StaleHandle);
        }
        let node = self.slots.remove(h.slot).ok_or(Error::StaleHandle)?;
        self.unlink(h.slot, &node.key, node.next);

        self.id_to_item[node.id as usize] = None;
        self.allocator.release(node.id);
        Ok((node.key, node.value))
    }

    /// Remove the item with this id. See `remove`.
    pub fn remove_id(&mut self, id: Id) -> Result<(K, V), Error> {
        let h = self.peek_id(id).ok_or(Error::UnknownId(id))?;
        self.remove(h)
    }

    // Splice `slot` out of its bin's chain by identity. `next` is the
    // removed item's own link.
    fn unlink(&mut self, slot: DefaultKey, key: &K, next: Option<DefaultKey>) {
        let bin = self.bin_of(key);
        if self.bins[bin] == Some(slot) {
            self.bins[bin] = next;
            return;
        }
        let mut cur = self.bins[bin];
        while let Some(c) = cur {
            let link = &mut self.slots[c].next;
            if *link == Some(slot) {
                *link = next;
                return;
            }
            cur = *link;
        }
        panic!("ParentHashMap::remove: item {key:?} not found in bin {bin}");
    }

    /// Keep only the items for which `keep` returns true. Items are visited
    /// in the same order as `iter`; removed items release their ids.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(Handle, &K, &mut V) -> bool,
    {
        for i in 0..self.used_bins.len() {
            let bin = self.used_bins[i];
            let mut prev: Option<DefaultKey> = None;
            let mut cur = self.bins[bin];
            while let Some(slot) = cur {
                let node = &mut self.slots[slot];
                let next = node.next;
                let h = Handle {
                    slot,
                    id: node.id,
                    table: self.stamp,
                };
                if keep(h, &node.key, &mut node.value) {
                    prev = Some(slot);
                } else {
                    match prev {
                        Some(p) => self.slots[p].next = next,
                        None => self.bins[bin] = next,
                    }
                    if let Some(gone) = self.slots.remove(slot) {
                        self.id_to_item[gone.id as usize] = None;
                        self.allocator.release(gone.id);
                    }
                }
                cur = next;
            }
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V, A> {
        Iter::new(self)
    }

    /// Mutable iteration. Order is unspecified and may differ from `iter`.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.iter_mut(),
            stamp: self.stamp,
        }
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.iter().map(|(h, _, _)| h)
    }
}

impl<'a, K, V, A> IntoIterator for &'a ParentHashMap<K, V, A>
where
    K: CanonicalKey,
    A: IdAllocator,
{
    type Item = (Handle, &'a K, &'a V);
    type IntoIter = Iter<'a, K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, A> Drop for ParentHashMap<K, V, A> {
    fn drop(&mut self) {
        let stats = self.counters.snapshot();
        if stats.is_excessive() {
            log::warn!(
                "ParentHashMap: {} collisions over {} queries with {} bins; \
                 the table needs more bins for this load",
                stats.collisions,
                stats.queries,
                self.bins.len()
            );
        }
    }
}
