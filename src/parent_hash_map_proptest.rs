#![cfg(test)]

// Property tests for ParentHashMap kept inside the crate so they can
// inspect registered bins and allocator state.

use crate::keys::{Key2, Key3, Parents};
use crate::parent_hash_map::{Handle, ParentHashMap};
use crate::Id;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};

// Parents are drawn from a small pool so that hits, misses, and
// re-creation after removal all happen often.
#[derive(Clone, Debug)]
enum Op {
    Get(u32, u32, i32),
    Peek(u32, u32),
    Remove(u32, u32),
    RemoveId(Id),
    PeekId(Id),
    Mutate(u32, u32, i32),
    Retain(u32),
    Iterate,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let p = 0u32..6;
    let op = prop_oneof![
        3 => (p.clone(), p.clone(), any::<i32>()).prop_map(|(a, b, v)| Op::Get(a, b, v)),
        1 => (p.clone(), p.clone()).prop_map(|(a, b)| Op::Peek(a, b)),
        2 => (p.clone(), p.clone()).prop_map(|(a, b)| Op::Remove(a, b)),
        1 => (0u32..24).prop_map(Op::RemoveId),
        1 => (0u32..24).prop_map(Op::PeekId),
        1 => (p.clone(), p.clone(), any::<i32>()).prop_map(|(a, b, d)| Op::Mutate(a, b, d)),
        1 => (2u32..5).prop_map(Op::Retain),
        1 => Just(Op::Iterate),
    ];
    proptest::collection::vec(op, 1..80)
}

// State-machine equivalence against a HashMap keyed by the sorted pair.
// Invariants checked after every op:
// - `get` on a present key returns the tracked handle and keeps the value.
// - `peek`/`peek_id` agree with the model; removed items never resolve.
// - Live ids are pairwise distinct and each maps back to its own item.
// - `iter` visits every live item exactly once.
// - Registered bins never shrink.
fn run_pairs(mut sut: ParentHashMap<Key2, i32>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key2, (Handle, i32)> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();
    let mut registered = 0;

    for op in ops {
        match op {
            Op::Get(a, b, v) => {
                let k = [a, b].canonicalize();
                let h = sut.get_or_insert_with([b, a], |_| v);
                match model.get(&k) {
                    Some(&(lh, lv)) => {
                        prop_assert_eq!(h, lh, "hit must return the existing item");
                        prop_assert_eq!(sut.value(h), Some(&lv));
                    }
                    None => {
                        model.insert(k, (h, v));
                    }
                }
            }
            Op::Peek(a, b) => {
                let k = [a, b].canonicalize();
                prop_assert_eq!(sut.peek([a, b]), model.get(&k).map(|e| e.0));
            }
            Op::Remove(a, b) => {
                let k = [a, b].canonicalize();
                match model.remove(&k) {
                    Some((h, v)) => {
                        let (kk, vv) = sut.remove(h).expect("live handle removes");
                        prop_assert_eq!(kk, k);
                        prop_assert_eq!(vv, v);
                        stale.push(h);
                    }
                    None => prop_assert!(sut.peek([a, b]).is_none()),
                }
            }
            Op::RemoveId(id) => {
                let live = model.iter().find(|(_, e)| e.0.id() == id).map(|(k, _)| *k);
                match live {
                    Some(k) => {
                        let (h, v) = model.remove(&k).expect("present");
                        prop_assert_eq!(sut.remove_id(id), Ok((k, v)));
                        stale.push(h);
                    }
                    None => prop_assert!(sut.remove_id(id).is_err()),
                }
            }
            Op::PeekId(id) => {
                let live = model.values().find(|e| e.0.id() == id).map(|e| e.0);
                prop_assert_eq!(sut.peek_id(id), live);
            }
            Op::Mutate(a, b, d) => {
                let k = [a, b].canonicalize();
                if let Some(e) = model.get_mut(&k) {
                    let v = sut.value_mut(e.0).expect("live handle resolves");
                    *v = v.wrapping_add(d);
                    e.1 = e.1.wrapping_add(d);
                }
            }
            Op::Retain(m) => {
                sut.retain(|_, k, _| (k.p1 + k.p2) % m != 0);
                let gone: Vec<Key2> = model
                    .keys()
                    .filter(|k| (k.p1 + k.p2) % m == 0)
                    .copied()
                    .collect();
                for k in gone {
                    let (h, _) = model.remove(&k).expect("present");
                    stale.push(h);
                }
            }
            Op::Iterate => {
                let seen: Vec<(Key2, i32)> = sut.iter().map(|(_, k, v)| (*k, *v)).collect();
                let unique: BTreeSet<Key2> = seen.iter().map(|e| e.0).collect();
                prop_assert_eq!(seen.len(), unique.len(), "item visited twice");
                let mut expected: Vec<(Key2, i32)> = model.iter().map(|(k, e)| (*k, e.1)).collect();
                let mut seen = seen;
                seen.sort();
                expected.sort();
                prop_assert_eq!(seen, expected);
            }
        }

        for h in &stale {
            prop_assert!(sut.value(*h).is_none(), "stale handle resolved");
        }
        prop_assert_eq!(sut.len(), model.len());
        let ids: BTreeSet<Id> = model.values().map(|e| e.0.id()).collect();
        prop_assert_eq!(ids.len(), model.len(), "live ids collide");
        for (k, (h, _)) in &model {
            prop_assert_eq!(sut.peek_id(h.id()), Some(*h));
            prop_assert_eq!(sut.key(*h), Some(k));
        }
        prop_assert!(sut.registered_bins() >= registered);
        registered = sut.registered_bins();
        prop_assert_eq!(sut.iter().count(), model.len());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        run_pairs(ParentHashMap::with_bins(16).unwrap(), ops)?;
    }
}

// Property: same invariants with a single bin, so every item shares one
// chain and every removal splices at the head, middle, or tail.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_single_bin(ops in arb_ops()) {
        run_pairs(ParentHashMap::with_bins(1).unwrap(), ops)?;
    }
}

// Property: every permutation of four parents names one item, keyed by
// the three smallest values in ascending order.
proptest! {
    #[test]
    fn prop_quad_permutations_agree(
        parents in proptest::array::uniform4(any::<u32>()),
        perm in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
    ) {
        let mut sut: ParentHashMap<Key3, ()> = ParentHashMap::with_bins(64).unwrap();
        let h = sut.get(parents);
        let shuffled = [parents[perm[0]], parents[perm[1]], parents[perm[2]], parents[perm[3]]];
        prop_assert_eq!(sut.get(shuffled), h);
        prop_assert_eq!(sut.len(), 1);

        let mut sorted = parents;
        sorted.sort_unstable();
        let key = sut.key(h).expect("live");
        prop_assert_eq!(key.as_array(), [sorted[0], sorted[1], sorted[2]]);
    }
}
