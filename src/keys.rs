//! Canonical keys: order-independent forms of parent id sets.
//!
//! Callers pass parents in any order. `Parents::canonicalize` sorts them
//! so that every permutation of the same set maps to one `CanonicalKey`.
//! Four-parent input keeps only the three smallest values; the largest
//! takes no part in hashing, equality, or storage.

use crate::parent_hash_map::Handle;
use crate::Id;

// Arbitrary odd multipliers, one per key component.
const M1: u32 = 984_120_265;
const M2: u32 = 125_965_121;
const M3: u32 = 495_698_413;

/// A sorted key that can be placed into a bin.
pub trait CanonicalKey: Copy + Eq + core::fmt::Debug {
    /// Unmasked bin hash. The table masks it down to a bin index.
    fn bin_hash(&self) -> u32;
}

/// Canonical key of a two-parent item, `p1 <= p2`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Key2 {
    pub p1: Id,
    pub p2: Id,
}

impl Key2 {
    pub fn new(a: Id, b: Id) -> Self {
        if a <= b {
            Key2 { p1: a, p2: b }
        } else {
            Key2 { p1: b, p2: a }
        }
    }

    pub fn as_array(&self) -> [Id; 2] {
        [self.p1, self.p2]
    }
}

impl CanonicalKey for Key2 {
    #[inline]
    fn bin_hash(&self) -> u32 {
        M1.wrapping_mul(self.p1)
            .wrapping_add(M2.wrapping_mul(self.p2))
    }
}

/// Canonical key of a four-parent item: the three smallest parents,
/// `p1 <= p2 <= p3`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Key3 {
    pub p1: Id,
    pub p2: Id,
    pub p3: Id,
}

impl Key3 {
    /// Sorts four parents and drops the largest.
    pub fn from_four(a: Id, b: Id, c: Id, d: Id) -> Self {
        let mut p = [a, b, c, d];
        p.sort_unstable();
        Key3 {
            p1: p[0],
            p2: p[1],
            p3: p[2],
        }
    }

    pub fn as_array(&self) -> [Id; 3] {
        [self.p1, self.p2, self.p3]
    }
}

impl CanonicalKey for Key3 {
    #[inline]
    fn bin_hash(&self) -> u32 {
        M1.wrapping_mul(self.p1)
            .wrapping_add(M2.wrapping_mul(self.p2))
            .wrapping_add(M3.wrapping_mul(self.p3))
    }
}

/// Caller-side parent sets accepted by lookups.
///
/// Implemented for arrays and tuples of ids, and for arrays of `Handle`s
/// of items held in another table, whose ids are used as the parents.
pub trait Parents {
    type Key: CanonicalKey;

    fn canonicalize(self) -> Self::Key;
}

impl Parents for [Id; 2] {
    type Key = Key2;
    #[inline]
    fn canonicalize(self) -> Key2 {
        Key2::new(self[0], self[1])
    }
}

impl Parents for (Id, Id) {
    type Key = Key2;
    #[inline]
    fn canonicalize(self) -> Key2 {
        Key2::new(self.0, self.1)
    }
}

impl Parents for [Id; 4] {
    type Key = Key3;
    #[inline]
    fn canonicalize(self) -> Key3 {
        Key3::from_four(self[0], self[1], self[2], self[3])
    }
}

impl Parents for (Id, Id, Id, Id) {
    type Key = Key3;
    #[inline]
    fn canonicalize(self) -> Key3 {
        Key3::from_four(self.0, self.1, self.2, self.3)
    }
}

impl Parents for [Handle; 2] {
    type Key = Key2;
    #[inline]
    fn canonicalize(self) -> Key2 {
        self.map(|h| h.id()).canonicalize()
    }
}

impl Parents for [Handle; 4] {
    type Key = Key3;
    #[inline]
    fn canonicalize(self) -> Key3 {
        self.map(|h| h.id()).canonicalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key2_is_order_independent() {
        assert_eq!([7u32, 3].canonicalize(), Key2 { p1: 3, p2: 7 });
        assert_eq!([3u32, 7].canonicalize(), (7u32, 3u32).canonicalize());
        assert_eq!([5u32, 5].canonicalize(), Key2 { p1: 5, p2: 5 });
    }

    /// Every permutation of four parents reduces to the same three smallest.
    #[test]
    fn key3_drops_largest_of_four() {
        let expected = Key3 {
            p1: 10,
            p2: 20,
            p3: 30,
        };
        let perms = [
            [10u32, 20, 30, 40],
            [40, 30, 20, 10],
            [20, 40, 10, 30],
            [30, 10, 40, 20],
        ];
        for p in perms {
            assert_eq!(p.canonicalize(), expected, "{p:?}");
        }
        assert_eq!((40u32, 10u32, 30u32, 20u32).canonicalize(), expected);
    }

    #[test]
    fn key3_reduction_ignores_fourth_value() {
        assert_eq!(
            [1u32, 2, 3, 4].canonicalize(),
            [1u32, 2, 3, 1000].canonicalize()
        );
        assert_ne!([1u32, 2, 3, 4].canonicalize(), [1u32, 2, 4, 5].canonicalize());
    }

    #[test]
    fn bin_hash_wraps_instead_of_overflowing() {
        let k = Key3::from_four(u32::MAX, u32::MAX - 1, u32::MAX - 2, 0);
        assert_eq!(
            k,
            Key3 {
                p1: 0,
                p2: u32::MAX - 2,
                p3: u32::MAX - 1
            }
        );
        // M2 * (-3) + M3 * (-2), mod 2^32.
        let expected = M2
            .wrapping_mul(3)
            .wrapping_add(M3.wrapping_mul(2))
            .wrapping_neg();
        assert_eq!(k.bin_hash(), expected);
        let k = Key2::new(u32::MAX, u32::MAX);
        assert_eq!(k.bin_hash(), M1.wrapping_add(M2).wrapping_neg());
    }
}
